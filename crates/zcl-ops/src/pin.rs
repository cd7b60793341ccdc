//! Pin/unpin toggle (§4.M "Pin").
//!
//! Validates `runId` shape, enforces that the run directory is actually
//! contained within `<outRoot>/runs` (rejecting a symlinked escape), and
//! atomically flips `run.json`'s `pinned` flag.

use camino::Utf8Path;

use zcl_schema::run::RunRecord;
use zcl_utils::ids::is_valid_run_id;

/// Errors from [`set_pinned`].
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("runId '{0}' does not match the YYYYMMDD-HHMMSSZ-<hex6> grammar")]
    InvalidRunId(String),

    #[error("run directory for '{0}' does not exist")]
    NotFound(String),

    #[error("run directory for '{0}' resolves outside outRoot/runs")]
    Containment(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Set (or clear) the `pinned` flag on `run_id`'s `run.json`. A no-op
/// write (value already matches) still goes through the atomic-write
/// path so callers never have to special-case it.
pub fn set_pinned(out_root: &Utf8Path, run_id: &str, pinned: bool) -> Result<RunRecord, PinError> {
    if !is_valid_run_id(run_id) {
        return Err(PinError::InvalidRunId(run_id.to_string()));
    }

    let runs_root = out_root.join("runs");
    let run_dir = runs_root.join(run_id);
    if !run_dir.as_std_path().is_dir() {
        return Err(PinError::NotFound(run_id.to_string()));
    }
    check_containment(&runs_root, &run_dir, run_id)?;

    let run_path = run_dir.join("run.json");
    let mut record: RunRecord = serde_json::from_str(&std::fs::read_to_string(run_path.as_std_path())?)?;
    record.pinned = pinned;
    zcl_store::write_json_pretty_atomic(&run_path, &record)?;
    Ok(record)
}

fn check_containment(runs_root: &Utf8Path, run_dir: &Utf8Path, run_id: &str) -> Result<(), PinError> {
    let base = runs_root
        .as_std_path()
        .canonicalize()
        .map_err(|_| PinError::Containment(run_id.to_string()))?;
    let resolved = run_dir
        .as_std_path()
        .canonicalize()
        .map_err(|_| PinError::Containment(run_id.to_string()))?;
    if resolved.starts_with(&base) {
        Ok(())
    } else {
        Err(PinError::Containment(run_id.to_string()))
    }
}
