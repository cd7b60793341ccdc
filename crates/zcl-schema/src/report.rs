//! `attempt.report.json`: derived from the captured trace by the report
//! builder (component K).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::feedback::Classification;

/// Current schema version for [`AttemptReport`].
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// The derived report persisted at `attempt.report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptReport {
    /// Record schema version; must equal [`CURRENT_SCHEMA_VERSION`].
    pub schema_version: u32,
    /// Enclosing run id.
    pub run_id: String,
    /// Enclosing suite id.
    pub suite_id: String,
    /// Enclosing mission id.
    pub mission_id: String,
    /// Enclosing attempt id.
    pub attempt_id: String,
    /// When the report was built.
    pub computed_at: DateTime<Utc>,
    /// The attempt's `started_at`.
    pub started_at: DateTime<Utc>,
    /// The latest timestamp observed across trace/feedback, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Mirrors `feedback.ok`, if feedback is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// Mirrors `feedback.result`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Mirrors `feedback.result_json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_json: Option<serde_json::Value>,
    /// Mirrors `feedback.classification`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    /// Derived metrics from a single streaming pass over the trace.
    pub metrics: Metrics,
    /// Relative pointers to the artifacts this report was built from.
    pub artifacts: ArtifactPointers,
    /// Contract-invariant booleans mirroring the validator.
    pub integrity: Integrity,
    /// Evaluated suite expectations, if the parent run's `suite.json`
    /// contained this mission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectations: Option<ExpectationEvaluation>,
}

/// Derived metrics from one streaming pass over `tool.calls.jsonl`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Total number of trace events.
    pub tool_calls_total: u64,
    /// Trace event count by tool, omitted entirely when empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tool_calls_by_tool: BTreeMap<String, u64>,
    /// Trace event count by op, omitted entirely when empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tool_calls_by_op: BTreeMap<String, u64>,
    /// Total failed trace events.
    pub failures_total: u64,
    /// Failure count by code (`"UNKNOWN"` when the code is missing).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures_by_code: BTreeMap<String, u64>,
    /// Failures specifically coded `ZCL_E_TIMEOUT`.
    pub timeouts_total: u64,
    /// Total stdout bytes across the trace.
    pub out_bytes_total: u64,
    /// Total stderr bytes across the trace.
    pub err_bytes_total: u64,
    /// Count of events whose stdout preview was truncated.
    pub out_preview_truncated_total: u64,
    /// Count of events whose stderr preview was truncated.
    pub err_preview_truncated_total: u64,
    /// Sum of all per-event durations.
    pub duration_ms_total: u64,
    /// Minimum per-event duration, 0 if the trace is empty.
    pub duration_ms_min: u64,
    /// Maximum per-event duration, 0 if the trace is empty.
    pub duration_ms_max: u64,
    /// Mean per-event duration, 0 if the trace is empty.
    pub duration_ms_avg: f64,
    /// 50th percentile per-event duration (linear interpolation between
    /// closest ranks).
    pub duration_ms_p50: f64,
    /// 95th percentile per-event duration (linear interpolation between
    /// closest ranks).
    pub duration_ms_p95: f64,
    /// Count of retried tool calls: events grouped by `(tool, op,
    /// canonical(input))` with count > 1 and at least one failure
    /// contribute `count - 1`.
    pub retries_total: u64,
    /// `max(ts) - min(ts)` across the trace, in milliseconds; 0 when
    /// fewer than one event has a parseable timestamp.
    pub wall_time_ms: u64,
}

/// Relative (to the attempt directory) pointers to the artifacts a
/// report was built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPointers {
    /// `attempt.json`, always present.
    pub attempt: String,
    /// `feedback.json`, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// `tool.calls.jsonl`, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    /// `notes.jsonl`, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// `prompt.txt`, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Contract-invariant booleans computed the same way the validator
/// computes them, so a report and a validation run never disagree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrity {
    /// `tool.calls.jsonl` exists.
    pub trace_present: bool,
    /// `tool.calls.jsonl` exists and has >= 1 non-empty line.
    pub trace_non_empty: bool,
    /// `feedback.json` exists.
    pub feedback_present: bool,
    /// `feedback_present && !trace_non_empty` — the funnel-bypass
    /// invariant, computed inline rather than re-derived.
    pub funnel_bypass_suspected: bool,
}

/// Result of evaluating a mission's suite expectations against this
/// attempt's feedback. The evaluator itself is an external collaborator
/// (§4.K); the core only requires this output surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectationEvaluation {
    /// Whether every expectation passed.
    pub ok: bool,
    /// Per-failure codes and messages, verbatim from the evaluator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ExpectationFailure>,
}

/// One failed expectation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectationFailure {
    /// Stable failure code from the evaluator.
    pub code: String,
    /// Human-readable message from the evaluator.
    pub message: String,
}
