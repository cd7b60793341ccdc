//! `attempt.json`: one per attempt directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{IsolationModel, Mode, TimeoutStart};

/// Current schema version for [`AttemptRecord`].
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// The attempt record persisted at
/// `<outRoot>/runs/<runId>/attempts/<attemptId>/attempt.json`.
///
/// Mutable only by the timeout anchor writer (to set `timeout_started_at`
/// exactly once) and by the agent/harness updating its own fields before
/// termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    /// Record schema version; must equal [`CURRENT_SCHEMA_VERSION`].
    pub schema_version: u32,
    /// The enclosing run's id.
    pub run_id: String,
    /// The canonicalized suite id.
    pub suite_id: String,
    /// The canonicalized mission id.
    pub mission_id: String,
    /// `NNN-<canonical-mission>-r<retry>`.
    pub attempt_id: String,
    /// Identifier of the agent that ran this attempt, if known at
    /// allocation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Discovery or CI; CI is strict-by-default in the validator.
    #[serde(default)]
    pub mode: Mode,
    /// When the attempt directory was created.
    pub started_at: DateTime<Utc>,
    /// Timeout budget in milliseconds, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// When the timeout clock starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_start: Option<TimeoutStart>,
    /// Set exactly once by `EnsureTimeoutAnchor` when `timeout_start ==
    /// FirstToolCall`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_started_at: Option<DateTime<Utc>>,
    /// Whether this attempt blinds the agent to certain terms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blind: Option<bool>,
    /// Terms to blind, when `blind` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blind_terms: Option<Vec<String>>,
    /// Isolation model tag, mirrored into `ZCL_ISOLATION_MODEL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isolation_model: Option<IsolationModel>,
    /// Scratch directory the agent may use, if allocated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<String>,
    /// Filename of the written `attempt.env.sh`, if one was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_env_sh: Option<String>,
}

/// Identifiers every artifact inside an attempt directory must agree
/// with. Distinct from [`AttemptRecord`] because trace/note/capture
/// events only carry ids, not the full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptIds {
    /// The enclosing run's id.
    pub run_id: String,
    /// The canonicalized suite id.
    pub suite_id: String,
    /// The canonicalized mission id.
    pub mission_id: String,
    /// `NNN-<canonical-mission>-r<retry>`.
    pub attempt_id: String,
}

impl AttemptRecord {
    /// Extract the ids that every enclosed artifact must match.
    #[must_use]
    pub fn ids(&self) -> AttemptIds {
        AttemptIds {
            run_id: self.run_id.clone(),
            suite_id: self.suite_id.clone(),
            mission_id: self.mission_id.clone(),
            attempt_id: self.attempt_id.clone(),
        }
    }
}
