//! `tool.calls.jsonl`: one JSON object per line, the funnel's evidence.

use serde::{Deserialize, Serialize};

/// Current schema version for [`TraceEvent`].
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// One line of `tool.calls.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    /// Schema version; must equal [`CURRENT_SCHEMA_VERSION`].
    pub v: u32,
    /// UTC RFC3339 timestamp.
    pub ts: String,
    /// Enclosing run id; must match the attempt directory.
    pub run_id: String,
    /// Enclosing suite id.
    pub suite_id: String,
    /// Enclosing mission id.
    pub mission_id: String,
    /// Enclosing attempt id.
    pub attempt_id: String,
    /// Agent id, if the attempt declared one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Tool family, e.g. `cli`, `mcp`.
    pub tool: String,
    /// Operation within the tool.
    pub op: String,
    /// Opaque raw input JSON, preserved verbatim.
    pub input: serde_json::Value,
    /// Opaque raw enrichment JSON, preserved verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<serde_json::Value>,
    /// Outcome of the call.
    pub result: TraceResult,
    /// I/O byte accounting and previews.
    pub io: TraceIo,
    /// Integrity flags for this line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<TraceIntegrity>,
    /// Names of redaction rules that fired on this event's content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redactions_applied: Vec<String>,
}

/// Outcome of one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceResult {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Wall-clock duration of the call.
    pub duration_ms: u64,
    /// Stable failure code, when `ok == false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Process exit code, for CLI-family tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

/// I/O byte accounting for one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceIo {
    /// Total bytes written to stdout.
    pub out_bytes: u64,
    /// Total bytes written to stderr.
    pub err_bytes: u64,
    /// Bounded preview of stdout, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_preview: Option<String>,
    /// Bounded preview of stderr, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_preview: Option<String>,
}

/// Integrity annotations for one trace line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceIntegrity {
    /// Whether a preview was truncated to fit `PreviewMax`.
    #[serde(default)]
    pub truncated: bool,
}

/// Shape expected of a `cli`-family trace event's `input`.
#[derive(Debug, Clone, Deserialize)]
pub struct CliInput {
    /// Non-empty argv.
    pub argv: Vec<String>,
}

/// Shape expected of an `mcp`-family trace event's `input`.
#[derive(Debug, Clone, Deserialize)]
pub struct McpInput {
    /// Non-empty method name.
    pub method: String,
}

/// A `capture` object nested in a `cli` trace event's enrichment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliCaptureEnrichment {
    /// Relative path (within the attempt directory) to captured stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout_path: Option<String>,
    /// Relative path (within the attempt directory) to captured stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr_path: Option<String>,
}
