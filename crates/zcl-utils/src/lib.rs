//! Foundation utilities shared across the `zcl` workspace: identifier
//! canonicalization (component A), the exit-code/wire-error-code table,
//! structured logging bootstrap, and the workspace-level error
//! aggregator.

pub mod error;
pub mod exit_codes;
pub mod ids;
pub mod logging;
