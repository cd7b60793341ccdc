//! `notes.jsonl` and `captures.jsonl`: optional, append-only side channels.

use serde::{Deserialize, Serialize};

/// One line of `notes.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    /// Enclosing run id.
    pub run_id: String,
    /// Enclosing suite id.
    pub suite_id: String,
    /// Enclosing mission id.
    pub mission_id: String,
    /// Enclosing attempt id.
    pub attempt_id: String,
    /// Free-form note kind, e.g. `observation`, `decision`.
    pub kind: String,
    /// Exactly one of `message`/`data` may be present (both absent is
    /// allowed; both present is not).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Opaque structured payload, preserved verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl NoteEvent {
    /// `true` unless both `message` and `data` are present.
    #[must_use]
    pub fn has_at_most_one_payload(&self) -> bool {
        !(self.message.is_some() && self.data.is_some())
    }
}

/// One line of `captures.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureEvent {
    /// Enclosing run id.
    pub run_id: String,
    /// Enclosing suite id.
    pub suite_id: String,
    /// Enclosing mission id.
    pub mission_id: String,
    /// Enclosing attempt id.
    pub attempt_id: String,
    /// Tool family this capture belongs to.
    pub tool: String,
    /// Operation within the tool.
    pub op: String,
    /// Opaque raw input JSON, preserved verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    /// Maximum bytes the capture was allowed to grow to; must be > 0.
    pub max_bytes: u64,
    /// Relative path (within the attempt directory) to captured stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout_path: Option<String>,
    /// Relative path (within the attempt directory) to captured stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr_path: Option<String>,
    /// Names of redaction rules that fired on this capture's content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redactions_applied: Vec<String>,
}
