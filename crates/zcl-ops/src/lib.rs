//! GC, pin, and doctor shims over the `zcl` artifact tree (component M).
//!
//! These three operations are grouped because each is an occasional,
//! operator-initiated sweep over `<outRoot>/runs` rather than part of an
//! attempt's own lifecycle; none of them run on the hot path of `Start`.

pub mod doctor;
pub mod gc;
pub mod pin;

pub use doctor::{Check, DoctorProbes, DoctorReport};
pub use gc::{CondemnReason, GcCandidate, GcError, GcPolicy, GcReport};
pub use pin::PinError;
