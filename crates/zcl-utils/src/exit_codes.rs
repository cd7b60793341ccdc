//! Process exit codes and the stable `ZCL_E_*` error code table (§6).
//!
//! | Exit code | Meaning |
//! |-----------|---------|
//! | 0 | success |
//! | 2 | usage errors |
//! | non-zero | everything else |
//!
//! The numeric exit code is a coarse signal for shells; the `ZCL_E_*`
//! string is the stable, grep-able identifier tooling should key off of.

/// A process exit code, distinct from the stable `ZCL_E_*` wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Operation completed successfully.
    pub const SUCCESS: Self = Self(0);
    /// Invalid CLI arguments or unresolved configuration.
    pub const USAGE: Self = Self(2);
    /// Everything else: contract violations, I/O failures, runtime errors.
    pub const GENERAL: Self = Self(1);

    /// The raw numeric value, suitable for `std::process::exit`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

/// The stable wire identifiers from §6, used in structured error output
/// and grep-friendly log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Bad CLI arguments or unresolved configuration.
    Usage,
    /// Underlying I/O failure (not otherwise classified).
    Io,
    /// A file that was expected to contain JSON did not parse.
    InvalidJson,
    /// A file that was expected to contain JSON Lines did not parse.
    InvalidJsonl,
    /// `schemaVersion` on a record is not one this build understands.
    SchemaUnsupported,
    /// A general artifact-contract violation not covered by a more
    /// specific code below.
    Contract,
    /// A size bound (preview, input, enrichment, ...) was exceeded.
    Bounds,
    /// Two ids that should match (e.g. trace line vs. enclosing attempt)
    /// did not.
    IdMismatch,
    /// A referenced path resolved outside its containing directory.
    Containment,
    /// A required artifact file is missing.
    MissingArtifact,
    /// A finalized attempt has no supporting trace evidence.
    MissingEvidence,
    /// `feedback.json` exists without a non-empty `tool.calls.jsonl`.
    FunnelBypass,
    /// A referenced capture file is unsafe to trust (path escape, missing,
    /// oversized).
    UnsafeEvidence,
    /// A suite expectation evaluated to failure.
    ExpectationFailed,
}

impl ErrorCode {
    /// The stable `ZCL_E_*` wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usage => "ZCL_E_USAGE",
            Self::Io => "ZCL_E_IO",
            Self::InvalidJson => "ZCL_E_INVALID_JSON",
            Self::InvalidJsonl => "ZCL_E_INVALID_JSONL",
            Self::SchemaUnsupported => "ZCL_E_SCHEMA_UNSUPPORTED",
            Self::Contract => "ZCL_E_CONTRACT",
            Self::Bounds => "ZCL_E_BOUNDS",
            Self::IdMismatch => "ZCL_E_ID_MISMATCH",
            Self::Containment => "ZCL_E_CONTAINMENT",
            Self::MissingArtifact => "ZCL_E_MISSING_ARTIFACT",
            Self::MissingEvidence => "ZCL_E_MISSING_EVIDENCE",
            Self::FunnelBypass => "ZCL_E_FUNNEL_BYPASS",
            Self::UnsafeEvidence => "ZCL_E_UNSAFE_EVIDENCE",
            Self::ExpectationFailed => "ZCL_E_EXPECTATION_FAILED",
        }
    }

    /// The exit code a CLI should use when this error code is the sole
    /// reason a command failed.
    #[must_use]
    pub const fn exit_code(self) -> ExitCode {
        match self {
            Self::Usage => ExitCode::USAGE,
            _ => ExitCode::GENERAL,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_are_stable_strings() {
        assert_eq!(ErrorCode::FunnelBypass.as_str(), "ZCL_E_FUNNEL_BYPASS");
        assert_eq!(ErrorCode::Usage.as_str(), "ZCL_E_USAGE");
    }

    #[test]
    fn usage_maps_to_exit_code_2() {
        assert_eq!(ErrorCode::Usage.exit_code().as_i32(), 2);
        assert_eq!(ErrorCode::Contract.exit_code().as_i32(), 1);
    }
}
