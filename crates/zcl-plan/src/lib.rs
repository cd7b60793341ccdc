//! Suite planner (component L, §4.L): fans one suite snapshot out into N
//! allocated attempt directories.
//!
//! The planner is a thin loop over `zcl_lifecycle::start`; it never
//! touches the filesystem directly and never mutates an artifact once
//! `start` has returned it.

pub mod suite;

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use camino::Utf8Path;
use chrono::{DateTime, Utc};

use zcl_schema::common::{IsolationModel, Mode, TimeoutStart};
use zcl_schema::suite::SuiteSnapshot;
use zcl_lifecycle::{start, LifecycleError, StartOptions};

use suite::{MissionDefaults, SuiteDocument};

/// Errors from [`plan`].
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("suite document did not parse: {0}")]
    InvalidSuite(#[from] serde_json::Error),

    #[error("suite declares no missions")]
    EmptySuite,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Plan-level overrides, taking precedence over both the suite's
/// defaults and any per-mission override (§4.L: "the suite's defaults
/// ... overridden by explicit plan options").
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Reuse an existing run rather than allocating one. Left `None` to
    /// let the first `Start` call allocate it.
    pub run_id: Option<String>,
    pub agent_id: Option<String>,
    pub retry: u32,
    pub mode: Option<Mode>,
    pub timeout_ms: Option<u64>,
    pub timeout_start: Option<TimeoutStart>,
    pub blind: Option<bool>,
    pub blind_terms: Option<Vec<String>>,
    pub isolation_model: Option<IsolationModel>,
}

impl PlanOptions {
    /// Fold these plan-level overrides over a mission's already-resolved
    /// defaults, plan options winning field by field.
    fn apply_over(&self, mission_effective: &MissionDefaults) -> MissionDefaults {
        MissionDefaults {
            mode: self.mode.or(mission_effective.mode),
            timeout_ms: self.timeout_ms.or(mission_effective.timeout_ms),
            timeout_start: self.timeout_start.or(mission_effective.timeout_start),
            blind: self.blind.or(mission_effective.blind),
            blind_terms: self
                .blind_terms
                .clone()
                .or_else(|| mission_effective.blind_terms.clone()),
            isolation_model: self
                .isolation_model
                .clone()
                .or_else(|| mission_effective.isolation_model.clone()),
        }
    }
}

/// One mission's allocated attempt, as returned to the planner's caller.
#[derive(Debug, Clone)]
pub struct PlannedAttempt {
    pub mission_id: String,
    pub attempt_id: String,
    pub out_dir: Utf8PathBuf,
    pub out_dir_abs: Utf8PathBuf,
    pub env: BTreeMap<String, String>,
}

/// The full result of fanning a suite out into attempts.
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub run_id: String,
    pub suite_id: String,
    pub attempts: Vec<PlannedAttempt>,
}

/// Fan `suite_raw` out into one allocated attempt per declared mission.
///
/// `suite_raw` is kept both as the opaque [`SuiteSnapshot`] written to
/// `suite.json` and parsed into the conventional `{suiteId, defaults,
/// missions}` shape the planner needs to iterate over. Only the first
/// `Start` call allocates `runId`; every subsequent call in this fan-out
/// reuses it and hits the suite-snapshot deep-equal fast path in
/// `zcl_lifecycle::start`.
pub fn plan(
    now: DateTime<Utc>,
    out_root: &Utf8Path,
    suite_raw: serde_json::Value,
    options: PlanOptions,
) -> Result<PlanResult, PlanError> {
    let doc: SuiteDocument = serde_json::from_value(suite_raw.clone())?;
    if doc.missions.is_empty() {
        return Err(PlanError::EmptySuite);
    }
    let snapshot = SuiteSnapshot { value: suite_raw };

    let mut run_id = options.run_id.clone();
    let mut attempts = Vec::with_capacity(doc.missions.len());

    for mission in &doc.missions {
        let effective = options.apply_over(&mission.effective_defaults(&doc.defaults));

        let start_opts = StartOptions {
            run_id: run_id.clone(),
            suite_id: doc.suite_id.clone(),
            mission_id: mission.mission_id.clone(),
            agent_id: options.agent_id.clone(),
            mode: effective.mode.unwrap_or_default(),
            retry: options.retry,
            prompt: mission.prompt.clone(),
            timeout_ms: effective.timeout_ms,
            timeout_start: effective.timeout_start,
            blind: effective.blind,
            blind_terms: effective.blind_terms,
            suite_snapshot: Some(snapshot.clone()),
            isolation_model: effective.isolation_model,
        };

        let result = start(now, out_root, start_opts)?;
        run_id.get_or_insert_with(|| result.ids.run_id.clone());

        let out_dir_abs = result
            .attempt_dir
            .canonicalize_utf8()
            .unwrap_or_else(|_| result.attempt_dir.clone());

        attempts.push(PlannedAttempt {
            mission_id: mission.mission_id.clone(),
            attempt_id: result.ids.attempt_id,
            out_dir: result.attempt_dir,
            out_dir_abs,
            env: result.env,
        });
    }

    Ok(PlanResult {
        run_id: run_id.expect("at least one mission ran Start"),
        suite_id: doc.suite_id,
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use serde_json::json;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn two_mission_suite() -> serde_json::Value {
        json!({
            "suiteId": "Heftiweb Smoke",
            "defaults": {"mode": "discovery", "timeoutMs": 60000},
            "missions": [
                {"missionId": "Latest Blog Title", "prompt": "find the title"},
                {"missionId": "Homepage Status", "prompt": "check status", "timeoutMs": 30000},
            ],
        })
    }

    #[test]
    fn fans_out_one_attempt_per_mission_under_one_run() {
        let dir = TempDir::new().unwrap();
        let out_root = utf8_dir(&dir);
        let now = Utc::now();

        let result = plan(now, &out_root, two_mission_suite(), PlanOptions::default()).unwrap();

        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[0].attempt_id, "001-latest-blog-title-r0");
        assert_eq!(result.attempts[1].attempt_id, "001-homepage-status-r0");
        assert!(result.attempts[0]
            .out_dir
            .as_str()
            .starts_with(out_root.join("runs").join(&result.run_id).as_str()));
    }

    #[test]
    fn plan_options_override_both_suite_and_mission_defaults() {
        let dir = TempDir::new().unwrap();
        let out_root = utf8_dir(&dir);
        let now = Utc::now();

        let options = PlanOptions {
            timeout_ms: Some(5000),
            ..Default::default()
        };
        let result = plan(now, &out_root, two_mission_suite(), options).unwrap();

        for attempt in &result.attempts {
            let attempt_json = std::fs::read_to_string(
                attempt.out_dir.join("attempt.json").as_std_path(),
            )
            .unwrap();
            assert!(attempt_json.contains("\"timeoutMs\": 5000"));
        }
    }

    #[test]
    fn empty_suite_is_rejected() {
        let dir = TempDir::new().unwrap();
        let out_root = utf8_dir(&dir);
        let suite = json!({"suiteId": "empty", "missions": []});
        assert!(matches!(
            plan(Utc::now(), &out_root, suite, PlanOptions::default()),
            Err(PlanError::EmptySuite)
        ));
    }
}
