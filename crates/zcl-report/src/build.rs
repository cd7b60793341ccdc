//! `build_attempt_report` (§4.K): derives `attempt.report.json` from an
//! attempt directory's evidence in a single pass.

use camino::Utf8Path;
use chrono::{DateTime, Utc};

use zcl_schema::attempt::AttemptRecord;
use zcl_schema::feedback::FeedbackRecord;
use zcl_schema::notes::NoteEvent;
use zcl_schema::report::{
    ArtifactPointers, AttemptReport, ExpectationEvaluation, Integrity, CURRENT_SCHEMA_VERSION,
};
use zcl_schema::suite::SuiteSnapshot;
use zcl_schema::trace::TraceEvent;

use crate::error::ReportError;
use crate::metrics;

/// Evaluates a mission's suite expectations against a finalized attempt.
/// An external collaborator: the core only needs the output surface, not
/// an opinion on what an expectation language looks like.
pub trait ExpectationEvaluator {
    fn evaluate(&self, expectations: &serde_json::Value, feedback: &FeedbackRecord) -> ExpectationEvaluation;
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<Option<T>, ReportError> {
    let content = match std::fs::read_to_string(path.as_std_path()) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ReportError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ReportError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })
}

/// Build the derived report for a single attempt directory.
///
/// `enforce = strict || attempt.mode == ci`: under enforcement, a missing
/// `feedback.json` is fatal rather than merely reflected in `integrity`.
///
/// `evaluator` is consulted only when the parent run's `suite.json` is
/// present (`attempt_dir/../../suite.json`), the mission has an
/// `expectations` block, and `feedback.json` is present.
pub fn build_attempt_report(
    now: DateTime<Utc>,
    attempt_dir: &Utf8Path,
    strict: bool,
    evaluator: Option<&dyn ExpectationEvaluator>,
) -> Result<AttemptReport, ReportError> {
    let attempt_path = attempt_dir.join("attempt.json");
    let record: AttemptRecord = read_json(&attempt_path)?.ok_or(ReportError::MissingAttempt {
        path: attempt_path.clone(),
    })?;
    let enforce = strict || record.mode == zcl_schema::common::Mode::Ci;

    let feedback_path = attempt_dir.join("feedback.json");
    let feedback: Option<FeedbackRecord> = read_json(&feedback_path)?;
    if enforce && feedback.is_none() {
        return Err(ReportError::MissingFeedback { path: feedback_path });
    }

    let trace_path = attempt_dir.join("tool.calls.jsonl");
    let trace_present = trace_path.as_std_path().is_file();
    let events: Vec<TraceEvent> = if trace_present {
        zcl_store::read_jsonl(&trace_path).map_err(ReportError::Other)?
    } else {
        Vec::new()
    };
    let trace_non_empty = zcl_store::jsonl_has_non_empty_line(&trace_path).unwrap_or_else(|e| {
        tracing::warn!(path = %trace_path, error = %e, "could not check tool.calls.jsonl for non-empty lines");
        false
    });

    let notes_path = attempt_dir.join("notes.jsonl");
    let notes_present = notes_path.as_std_path().is_file();
    if notes_present {
        let _notes: Vec<NoteEvent> = zcl_store::read_jsonl(&notes_path).map_err(ReportError::Other)?;
    }

    let prompt_present = attempt_dir.join("prompt.txt").as_std_path().is_file();

    let metrics = metrics::compute(&events);

    let feedback_present = feedback.is_some();
    let integrity = Integrity {
        trace_present,
        trace_non_empty,
        feedback_present,
        funnel_bypass_suspected: feedback_present && !trace_non_empty,
    };

    let artifacts = ArtifactPointers {
        attempt: "attempt.json".to_string(),
        feedback: feedback_present.then(|| "feedback.json".to_string()),
        trace: trace_present.then(|| "tool.calls.jsonl".to_string()),
        notes: notes_present.then(|| "notes.jsonl".to_string()),
        prompt: prompt_present.then(|| "prompt.txt".to_string()),
    };

    let ended_at = latest_timestamp(&events, feedback.as_ref());

    let run_dir = attempt_dir.parent().and_then(|attempts| attempts.parent());
    let expectations = match (&feedback, evaluator, run_dir) {
        (Some(feedback), Some(evaluator), Some(run_dir)) => {
            let suite_path = run_dir.join("suite.json");
            match read_json::<SuiteSnapshot>(&suite_path)? {
                Some(suite) => suite
                    .mission_expectations(&record.mission_id)
                    .map(|expectations| evaluator.evaluate(expectations, feedback)),
                None => None,
            }
        }
        _ => None,
    };

    Ok(AttemptReport {
        schema_version: CURRENT_SCHEMA_VERSION,
        run_id: record.run_id,
        suite_id: record.suite_id,
        mission_id: record.mission_id,
        attempt_id: record.attempt_id,
        computed_at: now,
        started_at: record.started_at,
        ended_at,
        ok: feedback.as_ref().map(|f| f.ok),
        result: feedback.as_ref().and_then(|f| f.result.clone()),
        result_json: feedback.as_ref().and_then(|f| f.result_json.clone()),
        classification: feedback.as_ref().and_then(|f| f.classification),
        metrics,
        artifacts,
        integrity,
        expectations,
    })
}

fn latest_timestamp(events: &[TraceEvent], feedback: Option<&FeedbackRecord>) -> Option<DateTime<Utc>> {
    let mut latest: Option<DateTime<Utc>> = None;
    for event in events {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&event.ts) {
            let ts = ts.with_timezone(&Utc);
            if latest.is_none_or(|l| ts > l) {
                latest = Some(ts);
            }
        }
    }
    if let Some(feedback) = feedback {
        if latest.is_none_or(|l| feedback.created_at > l) {
            latest = Some(feedback.created_at);
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;
    use zcl_schema::common::Mode;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn write_attempt(dir: &Utf8Path) -> AttemptRecord {
        let record = AttemptRecord {
            schema_version: zcl_schema::attempt::CURRENT_SCHEMA_VERSION,
            run_id: "run-1".into(),
            suite_id: "suite-1".into(),
            mission_id: "mission-1".into(),
            attempt_id: "001-mission-1-r0".into(),
            agent_id: None,
            mode: Mode::Discovery,
            started_at: "2026-01-01T00:00:00Z".parse().unwrap(),
            timeout_ms: None,
            timeout_start: None,
            timeout_started_at: None,
            blind: None,
            blind_terms: None,
            isolation_model: None,
            scratch_dir: None,
            attempt_env_sh: None,
        };
        zcl_store::write_json_pretty_atomic(&dir.join("attempt.json"), &record).unwrap();
        record
    }

    #[test]
    fn missing_attempt_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir);
        let err = build_attempt_report(Utc::now(), &path, false, None).unwrap_err();
        assert!(matches!(err, ReportError::MissingAttempt { .. }));
    }

    #[test]
    fn report_without_side_artifacts_has_empty_metrics_and_no_bypass() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir);
        write_attempt(&path);

        let report = build_attempt_report(Utc::now(), &path, false, None).unwrap();
        assert_eq!(report.metrics.tool_calls_total, 0);
        assert!(!report.integrity.trace_present);
        assert!(!report.integrity.funnel_bypass_suspected);
        assert_eq!(report.artifacts.attempt, "attempt.json");
        assert!(report.artifacts.trace.is_none());
    }

    #[test]
    fn feedback_without_trace_marks_funnel_bypass_suspected() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir);
        write_attempt(&path);

        let feedback = FeedbackRecord {
            schema_version: zcl_schema::feedback::CURRENT_SCHEMA_VERSION,
            run_id: "run-1".into(),
            suite_id: "suite-1".into(),
            mission_id: "mission-1".into(),
            attempt_id: "001-mission-1-r0".into(),
            ok: true,
            result: Some("done".into()),
            result_json: None,
            classification: Some(zcl_schema::feedback::Classification::Pass),
            created_at: "2026-01-01T00:00:05Z".parse().unwrap(),
        };
        zcl_store::write_json_atomic(&path.join("feedback.json"), &feedback).unwrap();

        let report = build_attempt_report(Utc::now(), &path, false, None).unwrap();
        assert!(report.integrity.feedback_present);
        assert!(report.integrity.funnel_bypass_suspected);
        assert_eq!(report.ok, Some(true));
        assert_eq!(report.ended_at, Some(feedback.created_at));
    }

    #[test]
    fn strict_with_missing_feedback_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir);
        write_attempt(&path);

        let err = build_attempt_report(Utc::now(), &path, true, None).unwrap_err();
        assert!(matches!(err, ReportError::MissingFeedback { .. }));
    }

    #[test]
    fn ci_mode_requires_feedback_regardless_of_strict_flag() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir);
        let mut record = write_attempt(&path);
        record.mode = Mode::Ci;
        zcl_store::write_json_pretty_atomic(&path.join("attempt.json"), &record).unwrap();

        let err = build_attempt_report(Utc::now(), &path, false, None).unwrap_err();
        assert!(matches!(err, ReportError::MissingFeedback { .. }));
    }
}
