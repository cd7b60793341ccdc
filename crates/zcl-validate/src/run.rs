//! Run-level checks: `run.json` itself, plus fanning out to every
//! attempt directory nested under `attempts/`.

use camino::Utf8Path;

use zcl_schema::run::{RunRecord, CURRENT_SCHEMA_VERSION};

use crate::load::{self, LoadOutcome};
use crate::{attempt, ErrorCode, ValidationReport};

pub(crate) fn validate(run_dir: &Utf8Path, strict: bool, report: &mut ValidationReport) {
    let run_path = run_dir.join("run.json");
    let record = match load::load::<RunRecord>(&run_path) {
        LoadOutcome::Missing => {
            report.error(ErrorCode::MissingArtifact, "run.json is missing", Some(run_path));
            return;
        }
        LoadOutcome::Io(e) => {
            report.error(ErrorCode::Io, format!("reading run.json: {e}"), Some(run_path));
            return;
        }
        LoadOutcome::InvalidJson(e) => {
            report.error(ErrorCode::InvalidJson, format!("run.json: {e}"), Some(run_path));
            return;
        }
        LoadOutcome::Ok(_raw, record) => record,
    };

    if record.schema_version != CURRENT_SCHEMA_VERSION {
        report.error(
            ErrorCode::SchemaUnsupported,
            format!(
                "run.json schemaVersion {} is not supported (expected {CURRENT_SCHEMA_VERSION})",
                record.schema_version
            ),
            Some(run_path.clone()),
        );
    }

    let basename = run_dir.file_name().unwrap_or_default();
    if basename != record.run_id {
        report.error(
            ErrorCode::IdMismatch,
            format!("run directory name '{basename}' does not match runId '{}'", record.run_id),
            Some(run_dir.to_path_buf()),
        );
    }

    let attempts_dir = run_dir.join("attempts");
    let names = match zcl_store::list_child_dir_names(&attempts_dir) {
        Ok(names) => names,
        Err(e) => {
            report.error(
                ErrorCode::Io,
                format!("listing attempts/: {e}"),
                Some(attempts_dir),
            );
            return;
        }
    };

    for name in names {
        let attempt_dir = attempts_dir.join(&name);
        attempt::validate(&attempt_dir, strict, report, Some(&record));
    }
}
