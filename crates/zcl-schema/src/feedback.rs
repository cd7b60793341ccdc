//! `feedback.json`: the finalized outcome of an attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version for [`FeedbackRecord`].
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Closed classification enum for a finalized attempt's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The mission's expectations were met.
    Pass,
    /// The mission's expectations were not met.
    Fail,
    /// The attempt could not produce a determinable outcome.
    Indeterminate,
    /// The attempt was aborted by timeout, crash, or operator action.
    Aborted,
}

/// The feedback record persisted at `feedback.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// Schema version of this record; unknown versions are rejected.
    pub schema_version: u32,
    /// Enclosing run id.
    pub run_id: String,
    /// Enclosing suite id.
    pub suite_id: String,
    /// Enclosing mission id.
    pub mission_id: String,
    /// Enclosing attempt id.
    pub attempt_id: String,
    /// Whether the agent believes it succeeded.
    pub ok: bool,
    /// Exactly one of `result`/`result_json` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Exactly one of `result`/`result_json` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_json: Option<serde_json::Value>,
    /// Closed outcome classification, if determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    /// When this record was written.
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// `true` when exactly one of `result`/`result_json` is set, as the
    /// schema requires.
    #[must_use]
    pub fn has_exactly_one_result(&self) -> bool {
        self.result.is_some() != self.result_json.is_some()
    }
}
