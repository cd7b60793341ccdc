//! Shared enums threaded through most record types.

use serde::{Deserialize, Serialize};

/// Attempt mode: `discovery` is exploratory and lenient; `ci` is
/// strict-by-default (§4.J, §9 "Strict-by-default CI").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Exploratory runs; validator warnings instead of errors for most
    /// checks.
    Discovery,
    /// Continuous-integration runs; validator enforces strict mode
    /// regardless of the caller's `--strict` flag.
    Ci,
}

impl Default for Mode {
    fn default() -> Self {
        Self::Discovery
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovery => f.write_str("discovery"),
            Self::Ci => f.write_str("ci"),
        }
    }
}

/// When a timeout's clock starts running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutStart {
    /// Clock starts at `Start`.
    AttemptStart,
    /// Clock starts when the first tool call is observed; anchored once
    /// by [`crate::attempt::AttemptRecord`]'s owner via
    /// `EnsureTimeoutAnchor`.
    FirstToolCall,
}

/// Isolation model tag, carried through to the agent's environment as
/// `ZCL_ISOLATION_MODEL` when set.
pub type IsolationModel = String;
