//! Persisting a built report.

use camino::{Utf8Path, Utf8PathBuf};

use zcl_schema::report::AttemptReport;

/// Atomically write `report` to `<attempt_dir>/attempt.report.json` as
/// canonical JSON, returning the path written.
pub fn write_attempt_report_atomic(
    attempt_dir: &Utf8Path,
    report: &AttemptReport,
) -> anyhow::Result<Utf8PathBuf> {
    let path = attempt_dir.join("attempt.report.json");
    zcl_store::write_json_atomic(&path, report)?;
    Ok(path)
}

/// Read back a previously written `attempt.report.json`, if any.
pub fn read_attempt_report(attempt_dir: &Utf8Path) -> anyhow::Result<Option<AttemptReport>> {
    let path = attempt_dir.join("attempt.report.json");
    match std::fs::read_to_string(path.as_std_path()) {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;
    use zcl_schema::report::{ArtifactPointers, Integrity, Metrics, CURRENT_SCHEMA_VERSION};

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn sample_report() -> AttemptReport {
        AttemptReport {
            schema_version: CURRENT_SCHEMA_VERSION,
            run_id: "run-1".into(),
            suite_id: "suite-1".into(),
            mission_id: "mission-1".into(),
            attempt_id: "001-mission-1-r0".into(),
            computed_at: "2026-01-01T00:00:00Z".parse().unwrap(),
            started_at: "2026-01-01T00:00:00Z".parse().unwrap(),
            ended_at: None,
            ok: None,
            result: None,
            result_json: None,
            classification: None,
            metrics: Metrics::default(),
            artifacts: ArtifactPointers {
                attempt: "attempt.json".into(),
                ..ArtifactPointers::default()
            },
            integrity: Integrity::default(),
            expectations: None,
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir);
        let report = sample_report();
        write_attempt_report_atomic(&path, &report).unwrap();

        let read_back = read_attempt_report(&path).unwrap().unwrap();
        assert_eq!(read_back.run_id, report.run_id);
    }

    #[test]
    fn missing_report_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir);
        assert!(read_attempt_report(&path).unwrap().is_none());
    }
}
