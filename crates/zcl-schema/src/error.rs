//! Schema-level errors: rejecting unknown `schemaVersion`s (§3).

/// Error returned when a persisted record's `schemaVersion` is not one
/// this build understands. Unknown versions are rejected outright;
/// unknown *fields* on a known version are preserved on read and ignored
/// on validation (forward-compatible) via `serde`'s default struct
/// behavior, so no explicit handling is needed for that half of the
/// rule.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported schema version {found} for {record} (supported: {supported})")]
pub struct UnsupportedSchemaVersion {
    /// Name of the record family, e.g. `"attempt.json"`.
    pub record: &'static str,
    /// The version found on disk.
    pub found: u32,
    /// The version this build supports.
    pub supported: u32,
}

/// Check a record's schema version, returning a typed error on mismatch.
pub fn check_schema_version(
    record: &'static str,
    found: u32,
    supported: u32,
) -> Result<(), UnsupportedSchemaVersion> {
    if found == supported {
        Ok(())
    } else {
        Err(UnsupportedSchemaVersion {
            record,
            found,
            supported,
        })
    }
}
