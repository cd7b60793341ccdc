//! Shared "read the file, keep both the raw value and the typed record"
//! loader. The raw value lets callers re-inspect fields `serde` already
//! normalized away (timestamp fractional-second precision, in
//! particular) without a second disk read.

use camino::Utf8Path;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Why a record could not be loaded.
pub(crate) enum LoadOutcome<T> {
    Missing,
    Io(std::io::Error),
    InvalidJson(serde_json::Error),
    Ok(Value, T),
}

pub(crate) fn load<T: DeserializeOwned>(path: &Utf8Path) -> LoadOutcome<T> {
    let content = match std::fs::read_to_string(path.as_std_path()) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::Missing,
        Err(e) => return LoadOutcome::Io(e),
    };
    let raw: Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => return LoadOutcome::InvalidJson(e),
    };
    match serde_json::from_value::<T>(raw.clone()) {
        Ok(typed) => LoadOutcome::Ok(raw, typed),
        Err(e) => LoadOutcome::InvalidJson(e),
    }
}

/// Whether an RFC3339 timestamp string carries fractional seconds.
/// `DateTime<Utc>`'s `Deserialize` accepts both; the contract wants
/// sub-second precision so traces/attempts can be ordered unambiguously.
pub(crate) fn has_fractional_seconds(raw: &str) -> bool {
    match (raw.find('T'), raw.find('.')) {
        (Some(t), Some(dot)) => dot > t,
        _ => false,
    }
}

/// Look up a named field on a JSON object as a string, for precision
/// checks performed against the raw value rather than the typed record.
pub(crate) fn raw_str_field<'a>(raw: &'a Value, field: &str) -> Option<&'a str> {
    raw.get(field)?.as_str()
}
