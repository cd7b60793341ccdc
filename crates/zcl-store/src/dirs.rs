//! Directory-counting helper used for GC's age/size eviction and the
//! suite planner's attempt-ordinal derivation (§4.L, §4.M).

use camino::Utf8Path;

/// Count immediate child directories of `path`. Returns `0` (not an
/// error) when `path` does not exist, matching the caller's expectation
/// that an unborn tree has zero children rather than being a failure.
pub fn count_child_dirs(path: &Utf8Path) -> std::io::Result<usize> {
    let entries = match std::fs::read_dir(path.as_std_path()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut count = 0;
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            count += 1;
        }
    }
    Ok(count)
}

/// List immediate child directory names of `path`, sorted lexically.
/// Empty when `path` does not exist.
pub fn list_child_dir_names(path: &Utf8Path) -> std::io::Result<Vec<String>> {
    let entries = match std::fs::read_dir(path.as_std_path()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
