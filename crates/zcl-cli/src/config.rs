//! Resolved engine configuration (§6 "Configuration").
//!
//! The suite/project/user config files themselves are an external
//! collaborator's concern; this module only implements the precedence
//! chain the core crates are handed a resolved value from: flag >
//! `ZCL_OUT_ROOT` > project config > user config > default `.zcl`.

use camino::Utf8PathBuf;

/// Already-resolved configuration the core crates consume. Nothing
/// downstream of this struct re-derives precedence.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub out_root: Utf8PathBuf,
    pub strategy_chain: Vec<String>,
}

const DEFAULT_OUT_ROOT: &str = ".zcl";

impl EngineConfig {
    /// Resolve from an explicit CLI flag plus the process environment,
    /// falling back to project/user config files and finally the
    /// built-in default.
    #[must_use]
    pub fn resolve(out_root_flag: Option<&str>, strategies_flag: Option<&str>) -> Self {
        let out_root = out_root_flag
            .map(str::to_string)
            .or_else(|| std::env::var("ZCL_OUT_ROOT").ok())
            .or_else(project_config_out_root)
            .or_else(user_config_out_root)
            .unwrap_or_else(|| DEFAULT_OUT_ROOT.to_string());

        let strategy_chain = strategies_flag
            .map(str::to_string)
            .or_else(|| std::env::var("ZCL_RUNTIME_STRATEGIES").ok())
            .or_else(project_config_strategies)
            .or_else(user_config_strategies)
            .map(|csv| csv.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();

        Self {
            out_root: Utf8PathBuf::from(out_root),
            strategy_chain,
        }
    }
}

/// Project-local config (`.zcl/config.json` under the current
/// directory). Format is an external collaborator's concern; we only
/// read the two fields the core needs.
fn project_config_out_root() -> Option<String> {
    read_config_field(".zcl/config.json", "outRoot")
}

fn project_config_strategies() -> Option<String> {
    read_config_field(".zcl/config.json", "runtimeStrategies")
}

fn user_config_out_root() -> Option<String> {
    user_config_path().and_then(|path| read_config_field(&path, "outRoot"))
}

fn user_config_strategies() -> Option<String> {
    user_config_path().and_then(|path| read_config_field(&path, "runtimeStrategies"))
}

fn user_config_path() -> Option<String> {
    let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).ok()?;
    Some(format!("{home}/.config/zcl/config.json"))
}

fn read_config_field(path: &str, field: &str) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    value.get(field)?.as_str().map(str::to_string)
}
