//! Derives `attempt.report.json` from an attempt directory's evidence
//! (§4.K): one streaming pass over `tool.calls.jsonl` plus whatever
//! `feedback.json`/`notes.jsonl`/`prompt.txt` happen to be present.
//!
//! The builder never fails validation the way the contract checker
//! (`zcl-validate`) does — it reports what it observed, including a
//! suspected funnel bypass, rather than refusing to run.

mod build;
mod error;
mod metrics;
mod writer;

pub use build::{build_attempt_report, ExpectationEvaluator};
pub use error::ReportError;
pub use writer::{read_attempt_report, write_attempt_report_atomic};

pub use zcl_schema::report::{
    ArtifactPointers, AttemptReport, ExpectationEvaluation, ExpectationFailure, Integrity, Metrics,
};
