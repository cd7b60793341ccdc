//! The conventional suite document shape the planner reads out of an
//! otherwise-opaque `SuiteSnapshot` (§4.L).
//!
//! `zcl_schema::suite::SuiteSnapshot` treats the suite file as opaque
//! JSON on purpose — the format is an external collaborator's concern.
//! The planner still needs *some* structure to fan out over, so it
//! parses the conventional `{suiteId, defaults, missions: [...]}` shape
//! `SuiteSnapshot::mission_expectations` already assumes elsewhere in
//! the core.

use serde::Deserialize;

use zcl_schema::common::{IsolationModel, Mode, TimeoutStart};

/// Per-mission scheduling knobs that can be set as suite-wide defaults
/// or overridden per mission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDefaults {
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub timeout_start: Option<TimeoutStart>,
    #[serde(default)]
    pub blind: Option<bool>,
    #[serde(default)]
    pub blind_terms: Option<Vec<String>>,
    #[serde(default)]
    pub isolation_model: Option<IsolationModel>,
}

impl MissionDefaults {
    /// `self` wins over `other` field by field.
    fn merged_over(self, other: &MissionDefaults) -> MissionDefaults {
        MissionDefaults {
            mode: self.mode.or(other.mode),
            timeout_ms: self.timeout_ms.or(other.timeout_ms),
            timeout_start: self.timeout_start.or(other.timeout_start),
            blind: self.blind.or(other.blind),
            blind_terms: self.blind_terms.or_else(|| other.blind_terms.clone()),
            isolation_model: self.isolation_model.or_else(|| other.isolation_model.clone()),
        }
    }
}

/// One declared mission, with optional per-mission overrides of the
/// suite's defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSpec {
    pub mission_id: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(flatten)]
    pub overrides: MissionDefaults,
}

/// The suite document as a whole.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteDocument {
    pub suite_id: String,
    #[serde(default)]
    pub defaults: MissionDefaults,
    pub missions: Vec<MissionSpec>,
}

impl MissionSpec {
    /// This mission's effective defaults: its own overrides, falling
    /// back to the suite's.
    #[must_use]
    pub fn effective_defaults(&self, suite_defaults: &MissionDefaults) -> MissionDefaults {
        self.overrides.clone().merged_over(suite_defaults)
    }
}
