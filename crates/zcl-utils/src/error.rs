//! Workspace-level error aggregation.
//!
//! Each core crate defines its own closed `thiserror` enum at its public
//! boundary. `ZclError` lets a CLI binary return a single `Result<T,
//! ZclError>` end to end without every crate depending on every other
//! crate's error type.

use crate::exit_codes::{ErrorCode, ExitCode};

/// A top-level error carrying the stable wire code alongside a
/// human-readable message, for binaries that need one `Result` type.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ZclError {
    /// The stable `ZCL_E_*` identifier.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

impl ZclError {
    /// Construct a new error from a code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The process exit code this error should produce.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        self.code.exit_code()
    }
}
