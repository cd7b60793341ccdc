//! Attempt-level checks: `attempt.json` itself, the funnel-bypass
//! invariant, and every optional side artifact (`feedback.json`,
//! `tool.calls.jsonl`, `notes.jsonl`, `captures.jsonl`,
//! `attempt.report.json`).

use camino::{Utf8Path, Utf8PathBuf};

use zcl_schema::attempt::{AttemptRecord, CURRENT_SCHEMA_VERSION as ATTEMPT_SCHEMA_VERSION};
use zcl_schema::bounds::{
    ENRICHMENT_MAX, FEEDBACK_MAX, NOTE_DATA_MAX, NOTE_MESSAGE_MAX, PREVIEW_MAX,
    REDACTIONS_APPLIED_MAX, REDACTION_NAME_MAX, TOOL_INPUT_MAX,
};
use zcl_schema::common::Mode;
use zcl_schema::feedback::{FeedbackRecord, CURRENT_SCHEMA_VERSION as FEEDBACK_SCHEMA_VERSION};
use zcl_schema::notes::{CaptureEvent, NoteEvent};
use zcl_schema::report::{AttemptReport, CURRENT_SCHEMA_VERSION as REPORT_SCHEMA_VERSION};
use zcl_schema::run::RunRecord;
use zcl_schema::trace::{CliCaptureEnrichment, CliInput, McpInput, TraceEvent, CURRENT_SCHEMA_VERSION as TRACE_SCHEMA_VERSION};
use zcl_utils::ids::sanitize_component;

use crate::containment::{self, Violation};
use crate::load::{self, has_fractional_seconds, raw_str_field, LoadOutcome};
use crate::{ErrorCode, ValidationReport};

pub(crate) fn validate(
    attempt_dir: &Utf8Path,
    base_strict: bool,
    report: &mut ValidationReport,
    parent_run: Option<&RunRecord>,
) {
    let attempt_path = attempt_dir.join("attempt.json");
    let (raw, record) = match load::load::<AttemptRecord>(&attempt_path) {
        LoadOutcome::Missing => {
            report.error(ErrorCode::MissingArtifact, "attempt.json is missing", Some(attempt_path));
            return;
        }
        LoadOutcome::Io(e) => {
            report.error(ErrorCode::Io, format!("reading attempt.json: {e}"), Some(attempt_path));
            return;
        }
        LoadOutcome::InvalidJson(e) => {
            report.error(ErrorCode::InvalidJson, format!("attempt.json: {e}"), Some(attempt_path));
            return;
        }
        LoadOutcome::Ok(raw, record) => (raw, record),
    };

    if record.schema_version != ATTEMPT_SCHEMA_VERSION {
        report.error(
            ErrorCode::SchemaUnsupported,
            format!(
                "attempt.json schemaVersion {} is not supported (expected {ATTEMPT_SCHEMA_VERSION})",
                record.schema_version
            ),
            Some(attempt_path.clone()),
        );
    }

    let enforce = base_strict || record.mode == Mode::Ci;

    check_directory_correspondence(attempt_dir, &record, report);
    if let Some(parent) = parent_run {
        if parent.run_id != record.run_id || parent.suite_id != record.suite_id {
            report.error(
                ErrorCode::IdMismatch,
                "attempt's runId/suiteId does not match the enclosing run.json",
                Some(attempt_path.clone()),
            );
        }
    }
    check_canonical_ids(&record, enforce, &attempt_path, report);
    check_timestamp_precision(&raw, "startedAt", enforce, &attempt_path, report);
    check_timestamp_precision(&raw, "timeoutStartedAt", enforce, &attempt_path, report);

    let feedback_path = attempt_dir.join("feedback.json");
    let feedback_present = feedback_path.as_std_path().is_file();
    if feedback_present {
        validate_feedback(&feedback_path, &record, report);
    }

    let trace_path = attempt_dir.join("tool.calls.jsonl");
    let trace_present = trace_path.as_std_path().is_file();
    let trace_non_empty = zcl_store::jsonl_has_non_empty_line(&trace_path).unwrap_or_else(|e| {
        tracing::warn!(path = %trace_path, error = %e, "could not check tool.calls.jsonl for non-empty lines");
        false
    });

    if feedback_present && !trace_non_empty {
        report.enforced(
            enforce,
            ErrorCode::FunnelBypass,
            "feedback.json is present but tool.calls.jsonl is missing or empty",
            Some(attempt_dir.to_path_buf()),
        );
    }

    if trace_present {
        match zcl_store::read_jsonl::<TraceEvent>(&trace_path) {
            Ok(events) => {
                for (idx, event) in events.iter().enumerate() {
                    validate_trace_event(attempt_dir, &record, idx, event, enforce, &trace_path, report);
                }
            }
            Err(e) => report.error(ErrorCode::InvalidJsonl, format!("tool.calls.jsonl: {e}"), Some(trace_path.clone())),
        }
    }

    let notes_path = attempt_dir.join("notes.jsonl");
    if notes_path.as_std_path().is_file() {
        match zcl_store::read_jsonl::<NoteEvent>(&notes_path) {
            Ok(notes) => {
                for (idx, note) in notes.iter().enumerate() {
                    validate_note(&record, idx, note, &notes_path, report);
                }
            }
            Err(e) => report.error(ErrorCode::InvalidJsonl, format!("notes.jsonl: {e}"), Some(notes_path.clone())),
        }
    }

    let captures_path = attempt_dir.join("captures.jsonl");
    if captures_path.as_std_path().is_file() {
        match zcl_store::read_jsonl::<CaptureEvent>(&captures_path) {
            Ok(captures) => {
                for (idx, capture) in captures.iter().enumerate() {
                    validate_capture(attempt_dir, &record, idx, capture, enforce, &captures_path, report);
                }
            }
            Err(e) => report.error(ErrorCode::InvalidJsonl, format!("captures.jsonl: {e}"), Some(captures_path.clone())),
        }
    }

    let report_path = attempt_dir.join("attempt.report.json");
    if report_path.as_std_path().is_file() {
        validate_attempt_report(&report_path, &record, report);
    }
}

fn check_directory_correspondence(attempt_dir: &Utf8Path, record: &AttemptRecord, report: &mut ValidationReport) {
    let basename = attempt_dir.file_name().unwrap_or_default();
    if basename != record.attempt_id {
        report.error(
            ErrorCode::IdMismatch,
            format!("attempt directory name '{basename}' does not match attemptId '{}'", record.attempt_id),
            Some(attempt_dir.to_path_buf()),
        );
    }

    if let Some(run_dir) = attempt_dir.parent().and_then(Utf8Path::parent) {
        let run_basename = run_dir.file_name().unwrap_or_default();
        if run_basename != record.run_id {
            report.error(
                ErrorCode::IdMismatch,
                format!("attempt's runId '{}' does not match enclosing run directory '{run_basename}'", record.run_id),
                Some(attempt_dir.to_path_buf()),
            );
        }
    }
}

fn check_canonical_ids(record: &AttemptRecord, enforce: bool, attempt_path: &Utf8Path, report: &mut ValidationReport) {
    for (label, value) in [("suiteId", &record.suite_id), ("missionId", &record.mission_id)] {
        match sanitize_component(value) {
            Ok(canonical) if &canonical != value => {
                report.enforced(
                    enforce,
                    ErrorCode::Contract,
                    format!("{label} '{value}' is not in canonical sanitized form (expected '{canonical}')"),
                    Some(attempt_path.to_path_buf()),
                );
            }
            Ok(_) => {}
            Err(_) => {
                report.error(
                    ErrorCode::Contract,
                    format!("{label} '{value}' does not sanitize to a non-empty canonical form"),
                    Some(attempt_path.to_path_buf()),
                );
            }
        }
    }
}

fn check_timestamp_precision(
    raw: &serde_json::Value,
    field: &str,
    enforce: bool,
    path: &Utf8Path,
    report: &mut ValidationReport,
) {
    if let Some(value) = raw_str_field(raw, field) {
        if !has_fractional_seconds(value) {
            report.enforced(
                enforce,
                ErrorCode::Contract,
                format!("{field} '{value}' lacks sub-second precision"),
                Some(path.to_path_buf()),
            );
        }
    }
}

fn ids_match(record: &AttemptRecord, run_id: &str, suite_id: &str, mission_id: &str, attempt_id: &str) -> bool {
    record.run_id == run_id
        && record.suite_id == suite_id
        && record.mission_id == mission_id
        && record.attempt_id == attempt_id
}

fn validate_feedback(feedback_path: &Utf8Path, attempt: &AttemptRecord, report: &mut ValidationReport) {
    let (raw, feedback) = match load::load::<FeedbackRecord>(feedback_path) {
        LoadOutcome::Missing => return,
        LoadOutcome::Io(e) => {
            report.error(ErrorCode::Io, format!("reading feedback.json: {e}"), Some(feedback_path.to_path_buf()));
            return;
        }
        LoadOutcome::InvalidJson(e) => {
            report.error(ErrorCode::InvalidJson, format!("feedback.json: {e}"), Some(feedback_path.to_path_buf()));
            return;
        }
        LoadOutcome::Ok(raw, feedback) => (raw, feedback),
    };

    if feedback.schema_version != FEEDBACK_SCHEMA_VERSION {
        report.error(
            ErrorCode::SchemaUnsupported,
            format!(
                "feedback.json schemaVersion {} is not supported (expected {FEEDBACK_SCHEMA_VERSION})",
                feedback.schema_version
            ),
            Some(feedback_path.to_path_buf()),
        );
    }

    if !ids_match(attempt, &feedback.run_id, &feedback.suite_id, &feedback.mission_id, &feedback.attempt_id) {
        report.error(
            ErrorCode::IdMismatch,
            "feedback.json ids do not match the enclosing attempt",
            Some(feedback_path.to_path_buf()),
        );
    }

    if !feedback.has_exactly_one_result() {
        report.error(
            ErrorCode::Contract,
            "feedback.json must set exactly one of result/resultJson",
            Some(feedback_path.to_path_buf()),
        );
    }

    let body_bytes = feedback.result.as_ref().map(String::len).unwrap_or(0)
        + feedback
            .result_json
            .as_ref()
            .and_then(|v| serde_json::to_vec(v).ok())
            .map(|b| b.len())
            .unwrap_or(0);
    if body_bytes > FEEDBACK_MAX {
        report.error(
            ErrorCode::Bounds,
            format!("feedback.json result body is {body_bytes} bytes, exceeding {FEEDBACK_MAX}"),
            Some(feedback_path.to_path_buf()),
        );
    }

    check_timestamp_precision(&raw, "createdAt", true, feedback_path, report);
}

#[allow(clippy::too_many_arguments)]
fn validate_trace_event(
    attempt_dir: &Utf8Path,
    attempt: &AttemptRecord,
    idx: usize,
    event: &TraceEvent,
    enforce: bool,
    trace_path: &Utf8Path,
    report: &mut ValidationReport,
) {
    let line = idx + 1;
    let line_path = Some(trace_path.to_path_buf());

    if !ids_match(attempt, &event.run_id, &event.suite_id, &event.mission_id, &event.attempt_id) {
        report.error(ErrorCode::IdMismatch, format!("tool.calls.jsonl line {line} ids do not match the enclosing attempt"), line_path.clone());
    }
    if event.v != TRACE_SCHEMA_VERSION {
        report.error(
            ErrorCode::SchemaUnsupported,
            format!("tool.calls.jsonl line {line} has schema version {} (expected {TRACE_SCHEMA_VERSION})", event.v),
            line_path.clone(),
        );
    }
    if !has_fractional_seconds(&event.ts) {
        report.enforced(enforce, ErrorCode::Contract, format!("tool.calls.jsonl line {line} ts lacks sub-second precision"), line_path.clone());
    }
    if chrono::DateTime::parse_from_rfc3339(&event.ts).is_err() {
        report.error(ErrorCode::Contract, format!("tool.calls.jsonl line {line} ts is not a valid RFC3339 timestamp"), line_path.clone());
    }

    if let Ok(bytes) = serde_json::to_vec(&event.input) {
        if bytes.len() > TOOL_INPUT_MAX {
            report.error(ErrorCode::Bounds, format!("tool.calls.jsonl line {line} input is {} bytes, exceeding {TOOL_INPUT_MAX}", bytes.len()), line_path.clone());
        }
    }
    if let Some(enrichment) = &event.enrichment {
        if let Ok(bytes) = serde_json::to_vec(enrichment) {
            if bytes.len() > ENRICHMENT_MAX {
                report.error(ErrorCode::Bounds, format!("tool.calls.jsonl line {line} enrichment is {} bytes, exceeding {ENRICHMENT_MAX}", bytes.len()), line_path.clone());
            }
        }
    }
    if let Some(preview) = &event.io.out_preview {
        if preview.len() > PREVIEW_MAX {
            report.error(ErrorCode::Bounds, format!("tool.calls.jsonl line {line} io.outPreview exceeds {PREVIEW_MAX} bytes"), line_path.clone());
        }
    }
    if let Some(preview) = &event.io.err_preview {
        if preview.len() > PREVIEW_MAX {
            report.error(ErrorCode::Bounds, format!("tool.calls.jsonl line {line} io.errPreview exceeds {PREVIEW_MAX} bytes"), line_path.clone());
        }
    }
    check_redactions(&event.redactions_applied, line, "tool.calls.jsonl", line_path.clone(), report);

    match event.tool.as_str() {
        "cli" => {
            match serde_json::from_value::<CliInput>(event.input.clone()) {
                Ok(cli) if cli.argv.is_empty() => {
                    report.error(ErrorCode::Contract, format!("tool.calls.jsonl line {line} cli input argv must be non-empty"), line_path.clone());
                }
                Ok(_) => {}
                Err(_) => {
                    report.error(ErrorCode::Contract, format!("tool.calls.jsonl line {line} cli input must be an object with an argv array"), line_path.clone());
                }
            }
            if let Some(enrichment) = &event.enrichment {
                if let Some(capture_value) = enrichment.get("capture") {
                    match serde_json::from_value::<CliCaptureEnrichment>(capture_value.clone()) {
                        Ok(capture) => {
                            check_relative_evidence_path(attempt_dir, capture.stdout_path.as_deref(), enforce, line, "stdoutPath", line_path.clone(), report);
                            check_relative_evidence_path(attempt_dir, capture.stderr_path.as_deref(), enforce, line, "stderrPath", line_path.clone(), report);
                        }
                        Err(_) => {
                            report.error(ErrorCode::Contract, format!("tool.calls.jsonl line {line} enrichment.capture is malformed"), line_path.clone());
                        }
                    }
                }
            }
        }
        "mcp" => match serde_json::from_value::<McpInput>(event.input.clone()) {
            Ok(mcp) if mcp.method.trim().is_empty() => {
                report.error(ErrorCode::Contract, format!("tool.calls.jsonl line {line} mcp input method must be non-empty"), line_path);
            }
            Ok(_) => {}
            Err(_) => {
                report.error(ErrorCode::Contract, format!("tool.calls.jsonl line {line} mcp input must be an object with a method string"), line_path);
            }
        },
        _ => {}
    }
}

fn validate_note(attempt: &AttemptRecord, idx: usize, note: &NoteEvent, notes_path: &Utf8Path, report: &mut ValidationReport) {
    let line = idx + 1;
    let line_path = Some(notes_path.to_path_buf());

    if !ids_match(attempt, &note.run_id, &note.suite_id, &note.mission_id, &note.attempt_id) {
        report.error(ErrorCode::IdMismatch, format!("notes.jsonl line {line} ids do not match the enclosing attempt"), line_path.clone());
    }
    if !note.has_at_most_one_payload() {
        report.error(ErrorCode::Contract, format!("notes.jsonl line {line} sets both message and data"), line_path.clone());
    }
    if let Some(message) = &note.message {
        if message.len() > NOTE_MESSAGE_MAX {
            report.error(ErrorCode::Bounds, format!("notes.jsonl line {line} message exceeds {NOTE_MESSAGE_MAX} bytes"), line_path.clone());
        }
    }
    if let Some(data) = &note.data {
        if let Ok(bytes) = serde_json::to_vec(data) {
            if bytes.len() > NOTE_DATA_MAX {
                report.error(ErrorCode::Bounds, format!("notes.jsonl line {line} data exceeds {NOTE_DATA_MAX} bytes"), line_path);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn validate_capture(
    attempt_dir: &Utf8Path,
    attempt: &AttemptRecord,
    idx: usize,
    capture: &CaptureEvent,
    enforce: bool,
    captures_path: &Utf8Path,
    report: &mut ValidationReport,
) {
    let line = idx + 1;
    let line_path = Some(captures_path.to_path_buf());

    if !ids_match(attempt, &capture.run_id, &capture.suite_id, &capture.mission_id, &capture.attempt_id) {
        report.error(ErrorCode::IdMismatch, format!("captures.jsonl line {line} ids do not match the enclosing attempt"), line_path.clone());
    }
    if capture.max_bytes == 0 {
        report.error(ErrorCode::Contract, format!("captures.jsonl line {line} maxBytes must be > 0"), line_path.clone());
    }
    check_redactions(&capture.redactions_applied, line, "captures.jsonl", line_path.clone(), report);

    for (label, relative) in [("stdoutPath", &capture.stdout_path), ("stderrPath", &capture.stderr_path)] {
        let Some(relative) = relative else { continue };
        match containment::check(attempt_dir, relative, enforce) {
            Ok(()) => {
                let candidate = attempt_dir.join(relative);
                if let Ok(metadata) = std::fs::metadata(candidate.as_std_path()) {
                    if metadata.len() > capture.max_bytes {
                        report.error(
                            ErrorCode::UnsafeEvidence,
                            format!("captures.jsonl line {line} {label} is {} bytes, exceeding maxBytes {}", metadata.len(), capture.max_bytes),
                            line_path.clone(),
                        );
                    }
                }
            }
            Err(violation) => push_containment_violation(report, violation, relative, line_path.clone()),
        }
    }
}

fn check_relative_evidence_path(
    attempt_dir: &Utf8Path,
    relative: Option<&str>,
    enforce: bool,
    line: usize,
    label: &str,
    path: Option<Utf8PathBuf>,
    report: &mut ValidationReport,
) {
    let Some(relative) = relative else { return };
    match containment::check(attempt_dir, relative, enforce) {
        Ok(()) => {}
        Err(violation) => {
            let prefixed = format!("tool.calls.jsonl line {line} {label}");
            push_containment_violation_labeled(report, violation, relative, &prefixed, path);
        }
    }
}

fn push_containment_violation(report: &mut ValidationReport, violation: Violation, relative: &str, path: Option<Utf8PathBuf>) {
    push_containment_violation_labeled(report, violation, relative, "path", path);
}

fn push_containment_violation_labeled(
    report: &mut ValidationReport,
    violation: Violation,
    relative: &str,
    label: &str,
    path: Option<Utf8PathBuf>,
) {
    match violation {
        Violation::Unsafe => report.error(ErrorCode::Containment, format!("{label} '{relative}' is not a safe relative path"), path),
        Violation::Escapes => report.error(ErrorCode::Containment, format!("{label} '{relative}' resolves outside the attempt directory"), path),
        Violation::Missing => report.error(ErrorCode::UnsafeEvidence, format!("{label} '{relative}' does not exist"), path),
    }
}

fn check_redactions(
    names: &[String],
    line: usize,
    artifact: &str,
    path: Option<Utf8PathBuf>,
    report: &mut ValidationReport,
) {
    if names.len() > REDACTIONS_APPLIED_MAX {
        report.error(
            ErrorCode::Bounds,
            format!("{artifact} line {line} redactionsApplied has {} entries, exceeding {REDACTIONS_APPLIED_MAX}", names.len()),
            path.clone(),
        );
    }
    for name in names {
        if name.len() > REDACTION_NAME_MAX {
            report.error(
                ErrorCode::Bounds,
                format!("{artifact} line {line} redaction name '{name}' exceeds {REDACTION_NAME_MAX} bytes"),
                path.clone(),
            );
        }
    }
}

fn validate_attempt_report(report_path: &Utf8Path, attempt: &AttemptRecord, report: &mut ValidationReport) {
    let (_raw, record) = match load::load::<AttemptReport>(report_path) {
        LoadOutcome::Missing => return,
        LoadOutcome::Io(e) => {
            report.error(ErrorCode::Io, format!("reading attempt.report.json: {e}"), Some(report_path.to_path_buf()));
            return;
        }
        LoadOutcome::InvalidJson(e) => {
            report.error(ErrorCode::InvalidJson, format!("attempt.report.json: {e}"), Some(report_path.to_path_buf()));
            return;
        }
        LoadOutcome::Ok(raw, record) => (raw, record),
    };

    if record.schema_version != REPORT_SCHEMA_VERSION {
        report.error(
            ErrorCode::SchemaUnsupported,
            format!(
                "attempt.report.json schemaVersion {} is not supported (expected {REPORT_SCHEMA_VERSION})",
                record.schema_version
            ),
            Some(report_path.to_path_buf()),
        );
    }
    if !ids_match(attempt, &record.run_id, &record.suite_id, &record.mission_id, &record.attempt_id) {
        report.error(
            ErrorCode::IdMismatch,
            "attempt.report.json ids do not match the enclosing attempt",
            Some(report_path.to_path_buf()),
        );
    }
    if record.artifacts.attempt != "attempt.json" {
        report.error(
            ErrorCode::Contract,
            format!("attempt.report.json artifacts.attempt must point at attempt.json, found '{}'", record.artifacts.attempt),
            Some(report_path.to_path_buf()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn write_attempt(attempt_dir: &Utf8Path, run_id: &str, attempt_id: &str, mode: Mode) {
        let record = AttemptRecord {
            schema_version: ATTEMPT_SCHEMA_VERSION,
            run_id: run_id.to_string(),
            suite_id: "smoke".to_string(),
            mission_id: "latest-blog-title".to_string(),
            attempt_id: attempt_id.to_string(),
            agent_id: None,
            mode,
            started_at: Utc::now(),
            timeout_ms: None,
            timeout_start: None,
            timeout_started_at: None,
            blind: None,
            blind_terms: None,
            isolation_model: None,
            scratch_dir: None,
            attempt_env_sh: None,
        };
        zcl_store::write_json_pretty_atomic(&attempt_dir.join("attempt.json"), &record).unwrap();
    }

    #[test]
    fn well_formed_attempt_with_no_side_artifacts_passes() {
        let dir = TempDir::new().unwrap();
        let attempt_dir = utf8_dir(&dir).join("001-latest-blog-title-r1");
        std::fs::create_dir_all(attempt_dir.as_std_path()).unwrap();
        write_attempt(&attempt_dir, "20260215-180012Z-abc123", "001-latest-blog-title-r1", Mode::Discovery);

        let mut report = ValidationReport::new(attempt_dir.clone(), false);
        validate(&attempt_dir, false, &mut report, None);
        assert!(report.ok(), "{:?}", report.errors);
    }

    #[test]
    fn directory_attempt_id_mismatch_is_an_error() {
        let dir = TempDir::new().unwrap();
        let attempt_dir = utf8_dir(&dir).join("wrong-name");
        std::fs::create_dir_all(attempt_dir.as_std_path()).unwrap();
        write_attempt(&attempt_dir, "20260215-180012Z-abc123", "001-latest-blog-title-r1", Mode::Discovery);

        let mut report = ValidationReport::new(attempt_dir.clone(), false);
        validate(&attempt_dir, false, &mut report, None);
        assert!(report.errors.iter().any(|f| f.code == ErrorCode::IdMismatch));
    }

    #[test]
    fn non_nano_started_at_is_flagged_under_strict() {
        let dir = TempDir::new().unwrap();
        let attempt_dir = utf8_dir(&dir).join("001-latest-blog-title-r1");
        std::fs::create_dir_all(attempt_dir.as_std_path()).unwrap();
        // Written as raw JSON (not through `AttemptRecord`) so `startedAt`
        // carries no fractional seconds, exercising the field lookup in
        // `check_timestamp_precision` directly against the on-disk camelCase key.
        let raw = serde_json::json!({
            "schemaVersion": ATTEMPT_SCHEMA_VERSION,
            "runId": "20260215-180012Z-abc123",
            "suiteId": "smoke",
            "missionId": "latest-blog-title",
            "attemptId": "001-latest-blog-title-r1",
            "mode": "ci",
            "startedAt": "2026-02-15T18:00:12Z",
        });
        std::fs::write(attempt_dir.join("attempt.json").as_std_path(), serde_json::to_vec(&raw).unwrap()).unwrap();

        let mut report = ValidationReport::new(attempt_dir.clone(), false);
        validate(&attempt_dir, false, &mut report, None);
        assert!(
            report.errors.iter().any(|f| f.code == ErrorCode::Contract),
            "{:?}",
            report.errors
        );
    }

    #[test]
    fn feedback_without_trace_is_funnel_bypass() {
        let dir = TempDir::new().unwrap();
        let attempt_dir = utf8_dir(&dir).join("001-latest-blog-title-r1");
        std::fs::create_dir_all(attempt_dir.as_std_path()).unwrap();
        write_attempt(&attempt_dir, "20260215-180012Z-abc123", "001-latest-blog-title-r1", Mode::Discovery);

        let feedback = zcl_schema::feedback::FeedbackRecord {
            schema_version: zcl_schema::feedback::CURRENT_SCHEMA_VERSION,
            run_id: "20260215-180012Z-abc123".to_string(),
            suite_id: "smoke".to_string(),
            mission_id: "latest-blog-title".to_string(),
            attempt_id: "001-latest-blog-title-r1".to_string(),
            ok: true,
            result: Some("done".to_string()),
            result_json: None,
            classification: None,
            created_at: Utc::now(),
        };
        zcl_store::write_json_atomic(&attempt_dir.join("feedback.json"), &feedback).unwrap();

        let mut report = ValidationReport::new(attempt_dir.clone(), false);
        validate(&attempt_dir, false, &mut report, None);
        assert!(report.warnings.iter().any(|f| f.code == ErrorCode::FunnelBypass));
        assert!(!report.errors.iter().any(|f| f.code == ErrorCode::FunnelBypass));

        let mut strict_report = ValidationReport::new(attempt_dir.clone(), true);
        validate(&attempt_dir, true, &mut strict_report, None);
        assert!(strict_report.errors.iter().any(|f| f.code == ErrorCode::FunnelBypass));
    }

    #[test]
    fn ci_mode_is_strict_regardless_of_caller_flag() {
        let dir = TempDir::new().unwrap();
        let attempt_dir = utf8_dir(&dir).join("001-latest-blog-title-r1");
        std::fs::create_dir_all(attempt_dir.as_std_path()).unwrap();
        write_attempt(&attempt_dir, "20260215-180012Z-abc123", "001-latest-blog-title-r1", Mode::Ci);

        let feedback = zcl_schema::feedback::FeedbackRecord {
            schema_version: zcl_schema::feedback::CURRENT_SCHEMA_VERSION,
            run_id: "20260215-180012Z-abc123".to_string(),
            suite_id: "smoke".to_string(),
            mission_id: "latest-blog-title".to_string(),
            attempt_id: "001-latest-blog-title-r1".to_string(),
            ok: true,
            result: Some("done".to_string()),
            result_json: None,
            classification: None,
            created_at: Utc::now(),
        };
        zcl_store::write_json_atomic(&attempt_dir.join("feedback.json"), &feedback).unwrap();

        let mut report = ValidationReport::new(attempt_dir.clone(), false);
        validate(&attempt_dir, false, &mut report, None);
        assert!(report.errors.iter().any(|f| f.code == ErrorCode::FunnelBypass));
    }
}
