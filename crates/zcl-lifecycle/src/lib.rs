//! Attempt and run directory allocation (component D, `Start` /
//! `EnsureTimeoutAnchor`).
//!
//! `Start` is the only place new directories are created under a run's
//! `attempts/` tree; every other component only reads what `Start`
//! wrote (or appends to files `Start` created empty).

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};

use zcl_schema::attempt::AttemptRecord;
use zcl_schema::common::{IsolationModel, Mode, TimeoutStart};
use zcl_schema::run::RunRecord;
use zcl_schema::suite::SuiteSnapshot;
use zcl_utils::ids::{format_attempt_id, is_valid_run_id, new_run_id, sanitize_component};

/// Errors from `Start` or `EnsureTimeoutAnchor`.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("suiteId/missionId must not be empty: {0}")]
    EmptyIdentifier(#[from] zcl_utils::ids::SanitizeError),

    #[error("runId '{0}' does not match the YYYYMMDD-HHMMSSZ-<hex6> grammar")]
    InvalidRunId(String),

    #[error("run.json exists with runId={existing_run_id}/suiteId={existing_suite_id}, but this Start requested runId={run_id}/suiteId={suite_id}")]
    RunMismatch {
        existing_run_id: String,
        existing_suite_id: String,
        run_id: String,
        suite_id: String,
    },

    #[error("suite.json exists and differs from the suiteSnapshot provided to this Start")]
    SuiteSnapshotMismatch,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Inputs to `Start` (spec §4.D).
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub run_id: Option<String>,
    pub suite_id: String,
    pub mission_id: String,
    pub agent_id: Option<String>,
    pub mode: Mode,
    pub retry: u32,
    pub prompt: Option<String>,
    pub timeout_ms: Option<u64>,
    pub timeout_start: Option<TimeoutStart>,
    pub blind: Option<bool>,
    pub blind_terms: Option<Vec<String>>,
    pub suite_snapshot: Option<SuiteSnapshot>,
    pub isolation_model: Option<IsolationModel>,
}

/// Output of `Start`: ids, absolute out dir, the canonical env map, and
/// the timestamp the attempt was created at.
#[derive(Debug, Clone)]
pub struct StartResult {
    pub ids: zcl_schema::attempt::AttemptIds,
    pub attempt_dir: Utf8PathBuf,
    pub env: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Allocate (or extend) a run directory and create a new attempt inside
/// it. Safe to call concurrently only under `zcl_lock::with_dir_lock` on
/// `<outRoot>/runs/<runId>/.lock`; single-writer callers need no lock.
pub fn start(
    now: DateTime<Utc>,
    out_root: &Utf8Path,
    opts: StartOptions,
) -> Result<StartResult, LifecycleError> {
    // 1. Canonicalize identifiers.
    let canonical_suite = sanitize_component(&opts.suite_id)?;
    let canonical_mission = sanitize_component(&opts.mission_id)?;

    // 2. Validate or allocate runId.
    let run_id = match &opts.run_id {
        Some(id) => {
            if !is_valid_run_id(id) {
                return Err(LifecycleError::InvalidRunId(id.clone()));
            }
            id.clone()
        }
        None => new_run_id(now),
    };

    let run_dir = out_root.join("runs").join(&run_id);
    let attempts_dir = run_dir.join("attempts");
    // 3. Create the attempts tree.
    std::fs::create_dir_all(attempts_dir.as_std_path())?;

    // 4. suite.json: write-or-compare.
    if let Some(snapshot) = &opts.suite_snapshot {
        let suite_path = run_dir.join("suite.json");
        if suite_path.as_std_path().exists() {
            let existing: SuiteSnapshot =
                serde_json::from_str(&std::fs::read_to_string(suite_path.as_std_path())?)?;
            if !existing.deep_equal(snapshot) {
                return Err(LifecycleError::SuiteSnapshotMismatch);
            }
        } else {
            zcl_store::write_json_atomic(&suite_path, snapshot)?;
        }
    }

    // 5. run.json: write-or-check.
    let run_path = run_dir.join("run.json");
    if run_path.as_std_path().exists() {
        let existing: RunRecord =
            serde_json::from_str(&std::fs::read_to_string(run_path.as_std_path())?)?;
        if existing.run_id != run_id || existing.suite_id != canonical_suite {
            return Err(LifecycleError::RunMismatch {
                existing_run_id: existing.run_id,
                existing_suite_id: existing.suite_id,
                run_id,
                suite_id: canonical_suite,
            });
        }
    } else {
        let record = RunRecord::new(run_id.clone(), canonical_suite.clone(), now);
        zcl_store::write_json_pretty_atomic(&run_path, &record)?;
    }

    // 6-7. Allocate the ordinal and create the attempt directory, retrying
    // on a lost mkdir race (spec's tie-break rule).
    let (attempt_id, attempt_dir) = loop {
        let ordinal = zcl_store::count_child_dirs(&attempts_dir)? as u32 + 1;
        let attempt_id = format_attempt_id(ordinal, &canonical_mission, opts.retry);
        let attempt_dir = attempts_dir.join(&attempt_id);
        match std::fs::create_dir(attempt_dir.as_std_path()) {
            Ok(()) => break (attempt_id, attempt_dir),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    };

    // 8. prompt.txt, if any.
    if let Some(prompt) = &opts.prompt {
        if !prompt.is_empty() {
            zcl_store::write_file_atomic(&attempt_dir.join("prompt.txt"), prompt.as_bytes())?;
        }
    }

    // 9. attempt.json.
    let record = AttemptRecord {
        schema_version: zcl_schema::attempt::CURRENT_SCHEMA_VERSION,
        run_id: run_id.clone(),
        suite_id: canonical_suite.clone(),
        mission_id: canonical_mission.clone(),
        attempt_id: attempt_id.clone(),
        agent_id: opts.agent_id.clone(),
        mode: opts.mode,
        started_at: now,
        timeout_ms: opts.timeout_ms,
        timeout_start: opts.timeout_start,
        timeout_started_at: None,
        blind: opts.blind,
        blind_terms: opts.blind_terms.clone(),
        isolation_model: opts.isolation_model.clone(),
        scratch_dir: None,
        attempt_env_sh: None,
    };
    zcl_store::write_json_pretty_atomic(&attempt_dir.join("attempt.json"), &record)?;

    // 10. Canonical env.
    let mut env = BTreeMap::new();
    env.insert("ZCL_RUN_ID".to_string(), run_id.clone());
    env.insert("ZCL_SUITE_ID".to_string(), canonical_suite.clone());
    env.insert("ZCL_MISSION_ID".to_string(), canonical_mission.clone());
    env.insert("ZCL_ATTEMPT_ID".to_string(), attempt_id.clone());
    env.insert(
        "ZCL_OUT_DIR".to_string(),
        attempt_dir.canonicalize_utf8().unwrap_or_else(|_| attempt_dir.clone()).to_string(),
    );
    if let Some(agent_id) = &opts.agent_id {
        env.insert("ZCL_AGENT_ID".to_string(), agent_id.clone());
    }
    if let Some(isolation_model) = &opts.isolation_model {
        env.insert("ZCL_ISOLATION_MODEL".to_string(), isolation_model.clone());
    }

    Ok(StartResult {
        ids: record.ids(),
        attempt_dir,
        env,
        created_at: now,
    })
}

/// Anchor a `first_tool_call`-timed timeout, idempotently. No-op unless
/// `timeout_ms > 0`, `timeout_start == FirstToolCall`, and
/// `timeout_started_at` is still unset.
pub fn ensure_timeout_anchor(
    now: DateTime<Utc>,
    attempt_dir: &Utf8Path,
) -> Result<(), LifecycleError> {
    let attempt_path = attempt_dir.join("attempt.json");
    let mut record: AttemptRecord =
        serde_json::from_str(&std::fs::read_to_string(attempt_path.as_std_path())?)?;

    let should_anchor = matches!(record.timeout_ms, Some(ms) if ms > 0)
        && record.timeout_start == Some(TimeoutStart::FirstToolCall)
        && record.timeout_started_at.is_none();

    if should_anchor {
        record.timeout_started_at = Some(now);
        zcl_store::write_json_pretty_atomic(&attempt_path, &record)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn base_opts() -> StartOptions {
        StartOptions {
            suite_id: "Heftiweb Smoke".to_string(),
            mission_id: "Latest Blog Title".to_string(),
            retry: 1,
            ..Default::default()
        }
    }

    #[test]
    fn two_starts_produce_stable_ordinals() {
        let dir = TempDir::new().unwrap();
        let out_root = utf8_dir(&dir);
        let now = Utc.with_ymd_and_hms(2026, 2, 15, 18, 0, 12).unwrap();

        let first = start(now, &out_root, base_opts()).unwrap();
        assert_eq!(first.ids.attempt_id, "001-latest-blog-title-r1");

        let second = start(now + chrono::Duration::seconds(1), &out_root, base_opts()).unwrap();
        assert_eq!(second.ids.attempt_id, "002-latest-blog-title-r1");
        assert_eq!(first.ids.run_id, second.ids.run_id);
    }

    #[test]
    fn start_rejects_empty_suite_id() {
        let dir = TempDir::new().unwrap();
        let out_root = utf8_dir(&dir);
        let now = Utc::now();
        let mut opts = base_opts();
        opts.suite_id = "   ".to_string();
        assert!(start(now, &out_root, opts).is_err());
    }

    #[test]
    fn no_tmp_files_remain_after_two_starts() {
        let dir = TempDir::new().unwrap();
        let out_root = utf8_dir(&dir);
        let now = Utc::now();
        let mut opts = base_opts();
        opts.run_id = Some(new_run_id(now));
        opts.prompt = Some("p1".to_string());
        let first = start(now, &out_root, opts.clone()).unwrap();

        let attempts_dir = first.attempt_dir.parent().unwrap().to_path_buf();
        let run_dir = attempts_dir.parent().unwrap();
        for entry in walkdir(run_dir) {
            assert!(!entry.contains(".tmp-"), "found stray temp file: {entry}");
        }
    }

    fn walkdir(path: &Utf8Path) -> Vec<String> {
        let mut out = Vec::new();
        if let Ok(entries) = std::fs::read_dir(path.as_std_path()) {
            for entry in entries.flatten() {
                let p = Utf8PathBuf::from_path_buf(entry.path()).unwrap();
                if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    out.extend(walkdir(&p));
                } else {
                    out.push(p.to_string());
                }
            }
        }
        out
    }

    #[test]
    fn ensure_timeout_anchor_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let out_root = utf8_dir(&dir);
        let now = Utc.with_ymd_and_hms(2026, 2, 15, 18, 0, 12).unwrap();
        let mut opts = base_opts();
        opts.timeout_ms = Some(5000);
        opts.timeout_start = Some(TimeoutStart::FirstToolCall);
        let result = start(now, &out_root, opts).unwrap();

        ensure_timeout_anchor(now + chrono::Duration::seconds(3), &result.attempt_dir).unwrap();
        let after_first: AttemptRecord = serde_json::from_str(
            &std::fs::read_to_string(result.attempt_dir.join("attempt.json").as_std_path())
                .unwrap(),
        )
        .unwrap();
        let anchored = after_first.timeout_started_at.unwrap();

        ensure_timeout_anchor(now + chrono::Duration::seconds(99), &result.attempt_dir).unwrap();
        let after_second: AttemptRecord = serde_json::from_str(
            &std::fs::read_to_string(result.attempt_dir.join("attempt.json").as_std_path())
                .unwrap(),
        )
        .unwrap();
        assert_eq!(after_second.timeout_started_at.unwrap(), anchored);
    }
}
