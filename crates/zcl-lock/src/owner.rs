//! `owner.json` — the record written inside a held lock directory so a
//! later waiter can decide whether the holder is still alive (§4.B).

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current `owner.json` schema version.
pub const OWNER_SCHEMA_VERSION: u32 = 1;

/// Identifies the process that currently holds a lock directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerInfo {
    #[serde(rename = "v")]
    pub version: u32,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

impl OwnerInfo {
    pub fn for_current_process(started_at: DateTime<Utc>) -> Self {
        Self {
            version: OWNER_SCHEMA_VERSION,
            pid: std::process::id(),
            started_at,
        }
    }
}

/// Write `owner.json` inside an already-created lock directory.
pub fn write_owner(lock_dir: &Utf8Path, owner: &OwnerInfo) -> anyhow::Result<()> {
    zcl_store::write_json_pretty_atomic(&lock_dir.join("owner.json"), owner)
}

/// Read `owner.json` from a lock directory, if present and parseable.
/// A missing or corrupt file is treated as "owner unknown" rather than
/// an error — the caller falls back to age-only staleness in that case.
pub fn read_owner(lock_dir: &Utf8Path) -> Option<OwnerInfo> {
    let content = std::fs::read_to_string(lock_dir.join("owner.json").as_std_path()).ok()?;
    serde_json::from_str(&content).ok()
}
