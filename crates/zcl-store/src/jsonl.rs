//! Append-only JSONL helpers for trace/notes files (§4.B, §4.H).

use camino::Utf8Path;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};

/// Append `line` (without a trailing newline) to the JSONL file at `path`,
/// creating it if necessary. A single `write` of `line + "\n"` keeps
/// concurrent single-line appends from interleaving on platforms where
/// `O_APPEND` writes are atomic up to the OS pipe/page size.
pub fn append_jsonl_line(path: &Utf8Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_std_path())?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Whether `path` exists and contains at least one non-empty (after
/// trimming) line. Used by the validator and report builder to decide
/// `trace_present`/`trace_non_empty` without fully parsing the file.
pub fn jsonl_has_non_empty_line(path: &Utf8Path) -> std::io::Result<bool> {
    let file = match std::fs::File::open(path.as_std_path()) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    let reader = BufReader::new(file);
    for line in reader.lines() {
        if !line?.trim().is_empty() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Parse every non-empty line in a JSONL file, returning them in file
/// order. Blank lines are skipped rather than treated as malformed.
pub fn read_jsonl<T: serde::de::DeserializeOwned>(
    path: &Utf8Path,
) -> anyhow::Result<Vec<T>> {
    let file = std::fs::File::open(path.as_std_path())?;
    let reader = BufReader::new(file);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn missing_file_is_not_non_empty() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("missing.jsonl");
        assert!(!jsonl_has_non_empty_line(&path).unwrap());
    }

    #[test]
    fn blank_lines_do_not_count() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("t.jsonl");
        append_jsonl_line(&path, "").unwrap();
        append_jsonl_line(&path, "   ").unwrap();
        assert!(!jsonl_has_non_empty_line(&path).unwrap());

        append_jsonl_line(&path, "{\"a\":1}").unwrap();
        assert!(jsonl_has_non_empty_line(&path).unwrap());
    }

    #[test]
    fn read_jsonl_round_trips_appended_values() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("t.jsonl");
        append_jsonl_line(&path, "{\"n\":1}").unwrap();
        append_jsonl_line(&path, "{\"n\":2}").unwrap();

        let values: Vec<serde_json::Value> = read_jsonl(&path).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["n"], 1);
        assert_eq!(values[1]["n"], 2);
    }
}
