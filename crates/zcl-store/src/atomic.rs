//! Write-through-temp-then-rename for files and JSON (§4.B).
//!
//! The temp file is always created in the same directory as the target
//! so the final rename is same-filesystem and therefore atomic on every
//! platform we support. On any error before rename the temp file is
//! removed; after a crash, no partial target file can exist.

use camino::Utf8Path;
use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

/// Atomically write `bytes` to `path`: create a sibling temp file with a
/// `.tmp-<random>` suffix in the same directory, write the content, fsync,
/// then rename over the target.
pub fn write_file_atomic(path: &Utf8Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::with_prefix_in(".tmp-", parent)?;
    let write_result = (|| {
        temp.write_all(bytes)?;
        temp.as_file().sync_all()
    })();

    if let Err(e) = write_result {
        // NamedTempFile removes itself on drop; nothing else to clean up.
        return Err(e);
    }

    temp.persist(path.as_std_path())
        .map_err(|persist_err| persist_err.error)?;
    Ok(())
}

/// Atomically write `value` as canonical JSON (JCS, RFC 8785) to `path`.
/// JCS gives byte-for-byte stable field order, independent of map
/// iteration order, which the deep-equal comparisons elsewhere in the
/// contract depend on.
pub fn write_json_atomic<T: serde::Serialize>(
    path: &Utf8Path,
    value: &T,
) -> anyhow::Result<()> {
    let canonical = serde_json_canonicalizer::to_string(value)?;
    write_file_atomic(path, canonical.as_bytes())?;
    Ok(())
}

/// Atomically write `value` as pretty-printed (2-space indent) JSON to
/// `path`. Used for records like `run.json`/`attempt.json` where
/// human-readability matters more than byte-stable canonicalization.
pub fn write_json_pretty_atomic<T: serde::Serialize>(
    path: &Utf8Path,
    value: &T,
) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(
        &mut buf,
        serde_json::ser::PrettyFormatter::with_indent(b"  "),
    );
    serde::Serialize::serialize(value, &mut ser)?;
    write_file_atomic(path, &buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Fixture {
        b: u32,
        a: String,
    }

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("f.json");
        let value = Fixture {
            b: 2,
            a: "x".into(),
        };
        write_json_atomic(&path, &value).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Fixture = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn no_tmp_files_remain_after_success() {
        let dir = TempDir::new().unwrap();
        let base = utf8_dir(&dir);
        write_file_atomic(&base.join("a.txt"), b"a").unwrap();
        write_file_atomic(&base.join("b.txt"), b"b").unwrap();

        let leftovers: Vec<_> = fs::read_dir(&base)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp-"))
            .collect();
        assert!(leftovers.is_empty(), "found stray temp files: {leftovers:?}");
    }

    #[test]
    fn jcs_output_is_key_order_independent() {
        let dir = TempDir::new().unwrap();
        let base = utf8_dir(&dir);
        let value = Fixture {
            b: 2,
            a: "x".into(),
        };
        write_json_atomic(&base.join("f.json"), &value).unwrap();
        let bytes = fs::read(base.join("f.json")).unwrap();
        // JCS sorts object keys; "a" must precede "b" regardless of
        // struct field declaration order.
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
    }
}
