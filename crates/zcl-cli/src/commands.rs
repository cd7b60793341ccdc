//! Subcommand bodies. Each one parses nothing itself (that's `args.rs`'s
//! job), resolves the already-built [`EngineConfig`], and calls straight
//! into the relevant core crate.

use std::io::Read;

use camino::Utf8Path;
use chrono::Utc;

use zcl_ops::doctor::DoctorProbes;
use zcl_schema::common::Mode;
use zcl_utils::error::ZclError;
use zcl_utils::exit_codes::ErrorCode;

use crate::args::Commands;
use crate::config::EngineConfig;

/// Run the subcommand `cli.command` asked for, returning the JSON value
/// to print on success.
pub fn dispatch(config: &EngineConfig, command: Commands) -> Result<serde_json::Value, ZclError> {
    match command {
        Commands::Start {
            run_id,
            suite_id,
            mission_id,
            agent_id,
            mode,
            retry,
            prompt,
            timeout_ms,
        } => start(config, run_id, suite_id, mission_id, agent_id, mode, retry, prompt, timeout_ms),
        Commands::Validate { target, strict } => validate(&target, strict),
        Commands::Report { target, strict } => report(&target, strict),
        Commands::Plan { suite, run_id, agent_id, retry } => plan(config, &suite, run_id, agent_id, retry),
        Commands::Gc { max_age_days, max_total_bytes, dry_run } => gc(config, max_age_days, max_total_bytes, dry_run),
        Commands::Pin { run_id, unpin } => pin(config, run_id, unpin),
        Commands::Doctor => doctor(config),
    }
}

#[allow(clippy::too_many_arguments)]
fn start(
    config: &EngineConfig,
    run_id: Option<String>,
    suite_id: String,
    mission_id: String,
    agent_id: Option<String>,
    mode: String,
    retry: u32,
    prompt: Option<String>,
    timeout_ms: Option<u64>,
) -> Result<serde_json::Value, ZclError> {
    let prompt = match prompt.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| ZclError::new(ErrorCode::Io, e.to_string()))?;
            Some(buf)
        }
        other => other.map(str::to_string),
    };

    let opts = zcl_lifecycle::StartOptions {
        run_id,
        suite_id,
        mission_id,
        agent_id,
        mode: if mode == "ci" { Mode::Ci } else { Mode::Discovery },
        retry,
        prompt,
        timeout_ms,
        ..Default::default()
    };

    let result = zcl_lifecycle::start(Utc::now(), &config.out_root, opts)
        .map_err(|e| ZclError::new(ErrorCode::Contract, e.to_string()))?;

    Ok(serde_json::json!({
        "runId": result.ids.run_id,
        "attemptId": result.ids.attempt_id,
        "outDir": result.attempt_dir.as_str(),
        "env": result.env,
    }))
}

fn validate(target: &Utf8Path, strict: bool) -> Result<serde_json::Value, ZclError> {
    let report = zcl_validate::validate_path(target, strict);
    let ok = report.ok();
    let value = serde_json::json!({
        "ok": ok,
        "target": report.target.as_str(),
        "errors": findings_json(&report.errors),
        "warnings": findings_json(&report.warnings),
    });
    if ok {
        Ok(value)
    } else {
        Err(ZclError::new(report.errors[0].code, format!("{} contract violation(s)", report.errors.len())))
    }
}

fn findings_json(findings: &[zcl_validate::Finding]) -> serde_json::Value {
    serde_json::Value::Array(
        findings
            .iter()
            .map(|f| {
                serde_json::json!({
                    "code": f.code.as_str(),
                    "message": f.message,
                    "path": f.path.as_ref().map(|p| p.as_str()),
                })
            })
            .collect(),
    )
}

fn report(target: &Utf8Path, strict: bool) -> Result<serde_json::Value, ZclError> {
    let built = zcl_report::build_attempt_report(Utc::now(), target, strict, None)
        .map_err(|e| ZclError::new(ErrorCode::Contract, e.to_string()))?;
    zcl_report::write_attempt_report_atomic(target, &built)
        .map_err(|e| ZclError::new(ErrorCode::Io, e.to_string()))?;
    serde_json::to_value(&built).map_err(|e| ZclError::new(ErrorCode::InvalidJson, e.to_string()))
}

fn plan(
    config: &EngineConfig,
    suite_path: &Utf8Path,
    run_id: Option<String>,
    agent_id: Option<String>,
    retry: u32,
) -> Result<serde_json::Value, ZclError> {
    let text = std::fs::read_to_string(suite_path.as_std_path())
        .map_err(|e| ZclError::new(ErrorCode::Io, e.to_string()))?;
    let suite_raw: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| ZclError::new(ErrorCode::InvalidJson, e.to_string()))?;

    let options = zcl_plan::PlanOptions {
        run_id,
        agent_id,
        retry,
        ..Default::default()
    };
    let result = zcl_plan::plan(Utc::now(), &config.out_root, suite_raw, options)
        .map_err(|e| ZclError::new(ErrorCode::Contract, e.to_string()))?;

    Ok(serde_json::json!({
        "runId": result.run_id,
        "suiteId": result.suite_id,
        "attempts": result.attempts.iter().map(|a| serde_json::json!({
            "missionId": a.mission_id,
            "attemptId": a.attempt_id,
            "outDir": a.out_dir.as_str(),
            "outDirAbs": a.out_dir_abs.as_str(),
            "env": a.env,
        })).collect::<Vec<_>>(),
    }))
}

fn gc(
    config: &EngineConfig,
    max_age_days: Option<u32>,
    max_total_bytes: Option<u64>,
    dry_run: bool,
) -> Result<serde_json::Value, ZclError> {
    let policy = zcl_ops::GcPolicy { max_age_days, max_total_bytes, dry_run };
    let result = zcl_ops::gc::collect(Utc::now(), &config.out_root, &policy)
        .map_err(|e| ZclError::new(ErrorCode::Io, e.to_string()))?;

    Ok(serde_json::json!({
        "dryRun": dry_run,
        "totalAfter": result.total_after,
        "deleted": result.deleted.iter().map(|c| serde_json::json!({
            "runId": c.run_id,
            "sizeBytes": c.size_bytes,
            "reason": match c.reason {
                zcl_ops::CondemnReason::Age => "age",
                zcl_ops::CondemnReason::Size => "size",
            },
        })).collect::<Vec<_>>(),
    }))
}

fn pin(config: &EngineConfig, run_id: String, unpin: bool) -> Result<serde_json::Value, ZclError> {
    let record = zcl_ops::pin::set_pinned(&config.out_root, &run_id, !unpin)
        .map_err(|e| ZclError::new(ErrorCode::Contract, e.to_string()))?;
    Ok(serde_json::json!({ "runId": record.run_id, "pinned": record.pinned }))
}

fn doctor(config: &EngineConfig) -> Result<serde_json::Value, ZclError> {
    let strategy_chain = config.strategy_chain.clone();
    let probes = DoctorProbes {
        project_config: Box::new(|| Ok(())),
        redaction_rules: Box::new(|| Ok(())),
        agent_binary: None,
        native_runtime: Box::new(move || {
            if strategy_chain.is_empty() {
                Err("no runtime strategy configured".to_string())
            } else {
                Ok(())
            }
        }),
        health_snapshot: Box::new(|| Ok(())),
    };
    let report = zcl_ops::doctor::run(&config.out_root, &probes);

    let value = serde_json::json!({
        "ok": report.ok,
        "checks": report.checks.iter().map(|c| serde_json::json!({
            "id": c.id,
            "ok": c.ok,
            "message": c.message,
        })).collect::<Vec<_>>(),
    });

    if report.ok {
        Ok(value)
    } else {
        Err(ZclError::new(ErrorCode::Contract, "one or more doctor checks failed"))
    }
}
