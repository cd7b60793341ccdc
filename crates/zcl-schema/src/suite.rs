//! `suite.json`: an opaque canonicalized snapshot of the suite that drove
//! a run. The suite file format itself is an external collaborator's
//! concern (§1); the core only needs to compare two snapshots for
//! semantic (decoded-value) equality.

use serde::{Deserialize, Serialize};

/// A suite snapshot as written to `suite.json`. The core treats the
/// payload as opaque JSON; only the suite/mission ids are inspected for
/// report-building (§4.K's expectation lookup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteSnapshot {
    /// Opaque, externally-defined suite document.
    #[serde(flatten)]
    pub value: serde_json::Value,
}

impl SuiteSnapshot {
    /// Semantic (decoded-value) equality, independent of key order or
    /// whitespace. §9 "Deep-equal on the suite snapshot" is load-bearing:
    /// different encoders may emit differently-shaped-but-equal JSON.
    #[must_use]
    pub fn deep_equal(&self, other: &Self) -> bool {
        self.value == other.value
    }

    /// Look up a mission's expectation block by id, if the snapshot has
    /// the conventional `missions: [{missionId, expectations}]` shape.
    #[must_use]
    pub fn mission_expectations(&self, mission_id: &str) -> Option<&serde_json::Value> {
        self.value
            .get("missions")?
            .as_array()?
            .iter()
            .find(|m| m.get("missionId").and_then(|v| v.as_str()) == Some(mission_id))
            .and_then(|m| m.get("expectations"))
    }
}
