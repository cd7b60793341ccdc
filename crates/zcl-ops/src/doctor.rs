//! Non-destructive self-check (§4.M "Doctor").
//!
//! Runs a small, fixed set of checks and reports each as a `Check{id, ok,
//! message}`. The suite parser and redaction-rule compiler are external
//! collaborators (§1); rather than depend on those crates directly,
//! `run` takes them as injectable closures so this crate never pulls in
//! out-of-scope dependencies just to self-check.

use camino::Utf8Path;

/// One check's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub id: &'static str,
    pub ok: bool,
    pub message: String,
}

impl Check {
    fn pass(id: &'static str, message: impl Into<String>) -> Self {
        Self { id, ok: true, message: message.into() }
    }

    fn fail(id: &'static str, message: impl Into<String>) -> Self {
        Self { id, ok: false, message: message.into() }
    }
}

/// Overall outcome of a doctor run.
#[derive(Debug, Clone)]
pub struct DoctorReport {
    pub ok: bool,
    pub checks: Vec<Check>,
}

/// Collaborators `doctor` cannot depend on directly. Each probe returns
/// `Ok(())` on success or an error message to surface as the check's
/// `message`.
pub struct DoctorProbes<'a> {
    /// Parses the project's suite/config document.
    pub project_config: Box<dyn Fn() -> Result<(), String> + 'a>,
    /// Compiles the configured redaction rule set.
    pub redaction_rules: Box<dyn Fn() -> Result<(), String> + 'a>,
    /// Confirms the configured agent binary is present and runnable.
    pub agent_binary: Option<Box<dyn Fn() -> Result<(), String> + 'a>>,
    /// Probes the native runtime strategy (e.g. a handshake against the
    /// configured adapter).
    pub native_runtime: Box<dyn Fn() -> Result<(), String> + 'a>,
    /// Confirms a health-counter snapshot is reachable.
    pub health_snapshot: Box<dyn Fn() -> Result<(), String> + 'a>,
}

/// Run every check and return the aggregate report. `out_root` is probed
/// directly for write access; every other check goes through `probes`.
pub fn run(out_root: &Utf8Path, probes: &DoctorProbes<'_>) -> DoctorReport {
    let mut checks = vec![
        check_write_access(out_root),
        from_probe("project_config", &probes.project_config),
        from_probe("redaction_rules", &probes.redaction_rules),
        from_probe("native_runtime", &probes.native_runtime),
        from_probe("health_snapshot", &probes.health_snapshot),
    ];

    if let Some(agent_binary) = &probes.agent_binary {
        checks.push(from_probe("agent_binary", agent_binary));
    }

    checks.sort_by_key(|c| c.id);
    let ok = checks.iter().all(|c| c.ok);
    DoctorReport { ok, checks }
}

fn from_probe(id: &'static str, probe: &dyn Fn() -> Result<(), String>) -> Check {
    match probe() {
        Ok(()) => Check::pass(id, "ok"),
        Err(message) => Check::fail(id, message),
    }
}

fn check_write_access(out_root: &Utf8Path) -> Check {
    if let Err(e) = std::fs::create_dir_all(out_root.as_std_path()) {
        return Check::fail("write_access", format!("cannot create {out_root}: {e}"));
    }
    let probe_path = out_root.join(".zcl-doctor-probe");
    match std::fs::write(probe_path.as_std_path(), b"probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(probe_path.as_std_path());
            Check::pass("write_access", format!("{out_root} is writable"))
        }
        Err(e) => Check::fail("write_access", format!("cannot write under {out_root}: {e}")),
    }
}
