//! Versioned record shapes, size bounds, and classification enums for the
//! `zcl` artifact tree (component C, §3).
//!
//! Every record here round-trips through `serde_json` and is written to
//! disk canonically (JCS) by `zcl-store`; unknown fields are preserved on
//! read via `serde`'s default behavior and ignored by the validator,
//! giving forward compatibility within a schema version.

pub mod attempt;
pub mod bounds;
pub mod common;
pub mod error;
pub mod feedback;
pub mod notes;
pub mod report;
pub mod run;
pub mod suite;
pub mod trace;

pub use attempt::{AttemptIds, AttemptRecord};
pub use common::{IsolationModel, Mode, TimeoutStart};
pub use feedback::{Classification, FeedbackRecord};
pub use notes::{CaptureEvent, NoteEvent};
pub use report::AttemptReport;
pub use run::RunRecord;
pub use suite::SuiteSnapshot;
pub use trace::TraceEvent;
