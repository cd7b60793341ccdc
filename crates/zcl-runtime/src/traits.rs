//! `Runtime` and `Session`: the pluggable-adapter seam (spec.md §4.F/G).

use std::collections::BTreeMap;
use std::time::Duration;

use crate::capability::CapabilitySet;
use crate::error::RuntimeError;
use crate::event::Event;

/// Opaque id returned by `add_listener`, used to remove it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Options a caller supplies to `start_session`.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Environment variables the caller wants forwarded, pre-policy.
    pub env: BTreeMap<String, String>,
    /// Adapter-specific extras (e.g. extra CLI args as key/value pairs).
    pub extras: BTreeMap<String, String>,
}

/// A pluggable AI-agent backend. Cheap to probe, expensive to start a
/// session against.
pub trait Runtime: Send + Sync {
    /// Lowercase strategy identifier, unique within a `Registry`.
    fn id(&self) -> &str;

    /// The capabilities this runtime supports.
    fn capabilities(&self) -> CapabilitySet;

    /// Cheap availability check with no side effects.
    fn probe(&self) -> Result<(), RuntimeError>;

    /// Start a new session against this runtime.
    fn start_session(&self, opts: SessionOptions) -> Result<Box<dyn Session>, RuntimeError>;
}

/// A live conversation with a runtime: threads, turns, and the event
/// stream they produce.
pub trait Session: Send {
    fn runtime_id(&self) -> &str;
    fn session_id(&self) -> &str;
    fn current_thread_id(&self) -> Option<String>;

    fn start_thread(&self) -> Result<String, RuntimeError>;
    fn resume_thread(&self, thread_id: &str) -> Result<(), RuntimeError>;
    fn start_turn(&self, thread_id: &str, input: &str) -> Result<String, RuntimeError>;
    fn steer_turn(&self, turn_id: &str, input: &str) -> Result<(), RuntimeError>;
    fn interrupt_turn(&self, turn_id: &str) -> Result<(), RuntimeError>;

    /// Register a listener invoked for every fanned-out event; returns an
    /// opaque id usable with `remove_listener`.
    fn add_listener(&self, listener: Box<dyn Fn(&Event) + Send + Sync>) -> ListenerId;
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Close the session: stop the child/stream within `timeout`, idempotent.
    fn close(&self, timeout: Duration) -> Result<(), RuntimeError>;
}
