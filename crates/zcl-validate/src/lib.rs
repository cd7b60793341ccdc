//! Artifact-tree contract validator (§4.J): walks a run or attempt
//! directory and reports every contract violation it finds, rather than
//! stopping at the first one.
//!
//! `ci` mode is strict-by-default regardless of the caller's `--strict`
//! flag; a violation that would merely warn in discovery mode becomes a
//! hard error once either the caller asked for strict or the attempt
//! itself declares `mode: ci`.

mod attempt;
mod containment;
mod load;
mod run;

use camino::{Utf8Path, Utf8PathBuf};

pub use zcl_utils::exit_codes::ErrorCode;

/// One contract violation or warning, accumulated rather than
/// short-circuited so a single validation pass surfaces everything wrong
/// with a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Stable `ZCL_E_*` wire code for the violation.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
    /// Path the finding is about, relative to the validated target when
    /// known.
    pub path: Option<Utf8PathBuf>,
}

impl Finding {
    fn new(code: ErrorCode, message: impl Into<String>, path: Option<Utf8PathBuf>) -> Self {
        Self {
            code,
            message: message.into(),
            path,
        }
    }
}

/// The result of validating a single target directory: every error and
/// warning discovered across the whole tree.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// The directory that was validated (an attempt dir or a run dir).
    pub target: Utf8PathBuf,
    /// Whether the caller asked for `--strict`.
    pub strict: bool,
    /// Contract violations. A non-empty list means the target fails
    /// validation.
    pub errors: Vec<Finding>,
    /// Violations that would be errors under strict/CI enforcement but
    /// were not enforced here.
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    fn new(target: Utf8PathBuf, strict: bool) -> Self {
        Self {
            target,
            strict,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Whether the target passed: no accumulated errors.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, code: ErrorCode, message: impl Into<String>, path: Option<Utf8PathBuf>) {
        self.errors.push(Finding::new(code, message, path));
    }

    fn warning(&mut self, code: ErrorCode, message: impl Into<String>, path: Option<Utf8PathBuf>) {
        self.warnings.push(Finding::new(code, message, path));
    }

    /// Push as an error when `enforce` is set, otherwise as a warning.
    /// Most of the contract's checks are "hard in strict/CI, advisory in
    /// discovery", so this is the workhorse call site.
    fn enforced(
        &mut self,
        enforce: bool,
        code: ErrorCode,
        message: impl Into<String>,
        path: Option<Utf8PathBuf>,
    ) {
        if enforce {
            self.error(code, message, path);
        } else {
            self.warning(code, message, path);
        }
    }
}

/// Validate `target`, auto-detecting whether it is an attempt directory
/// (has `attempt.json`) or a run directory (has `run.json`).
#[must_use]
pub fn validate_path(target: &Utf8Path, strict: bool) -> ValidationReport {
    let mut report = ValidationReport::new(target.to_path_buf(), strict);

    if target.join("attempt.json").as_std_path().is_file() {
        attempt::validate(target, strict, &mut report, None);
    } else if target.join("run.json").as_std_path().is_file() {
        run::validate(target, strict, &mut report);
    } else {
        report.error(
            ErrorCode::MissingArtifact,
            "target directory contains neither attempt.json nor run.json",
            Some(target.to_path_buf()),
        );
    }

    report
}

/// Validate a single attempt directory in isolation (no parent-run
/// cross-checks). Exposed separately because the suite planner and the
/// report builder both want to validate one attempt without walking an
/// entire run tree.
#[must_use]
pub fn validate_attempt(target: &Utf8Path, strict: bool) -> ValidationReport {
    let mut report = ValidationReport::new(target.to_path_buf(), strict);
    attempt::validate(target, strict, &mut report, None);
    report
}

/// Validate a run directory and every attempt nested under it.
#[must_use]
pub fn validate_run(target: &Utf8Path, strict: bool) -> ValidationReport {
    let mut report = ValidationReport::new(target.to_path_buf(), strict);
    run::validate(target, strict, &mut report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_target_reports_missing_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let report = validate_path(&target, false);
        assert!(!report.ok());
        assert_eq!(report.errors[0].code, ErrorCode::MissingArtifact);
    }
}
