//! `run.json`: one per run directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version for [`RunRecord`].
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Current artifact layout version (directory shape, not record shape).
pub const CURRENT_ARTIFACT_LAYOUT_VERSION: u32 = 1;

/// The run record persisted at `<outRoot>/runs/<runId>/run.json`.
///
/// Mutable only by the pin subsystem, which flips `pinned` via an atomic
/// rewrite; every other field is fixed at allocation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// Record schema version; must equal [`CURRENT_SCHEMA_VERSION`].
    pub schema_version: u32,
    /// On-disk layout version; must equal
    /// [`CURRENT_ARTIFACT_LAYOUT_VERSION`].
    pub artifact_layout_version: u32,
    /// The canonical run id, `basename` of the run directory.
    pub run_id: String,
    /// The canonicalized suite id that drove this run.
    pub suite_id: String,
    /// When the run directory was first created.
    pub created_at: DateTime<Utc>,
    /// Whether GC must skip this run regardless of age/size pressure.
    #[serde(default)]
    pub pinned: bool,
}

impl RunRecord {
    /// Construct a fresh, unpinned run record.
    #[must_use]
    pub fn new(run_id: String, suite_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            artifact_layout_version: CURRENT_ARTIFACT_LAYOUT_VERSION,
            run_id,
            suite_id,
            created_at,
            pinned: false,
        }
    }
}
