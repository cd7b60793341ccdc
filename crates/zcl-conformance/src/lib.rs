//! `RunBasic` (§4.I): the six-step conformance check any `Runtime` adapter
//! must pass before it ships. Exercised in-workspace against both the
//! real JSON-RPC adapter (via a fake child) and a minimal stub fixture,
//! so the harness itself is proven to reject an adapter that skips a
//! step.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use zcl_runtime::{CapabilitySet, Event, ListenerId, Runtime, RuntimeError, RuntimeErrorKind, Session, SessionOptions};

/// Options governing one `RunBasic` pass. Defaults match §4.I.
#[derive(Debug, Clone)]
pub struct RunBasicOptions {
    /// Capabilities the adapter must have. Default: thread start,
    /// interrupt, event stream.
    pub required: CapabilitySet,
    /// How long to wait for a terminal turn event once the turn starts.
    pub event_timeout: Duration,
    /// Text sent as the turn's input.
    pub turn_input: String,
}

impl Default for RunBasicOptions {
    fn default() -> Self {
        Self {
            required: CapabilitySet::conformance_default(),
            event_timeout: Duration::from_secs(3),
            turn_input: "conformance probe".to_string(),
        }
    }
}

/// What `RunBasic` observed on a passing run.
#[derive(Debug, Clone)]
pub struct RunBasicReport {
    pub thread_id: String,
    pub turn_id: String,
    pub terminal_event: Event,
}

/// Event names that count as a terminal turn event (§4.I step 6).
const TURN_COMPLETED: &str = "codex/event/turn-completed";
const TURN_FAILED: &str = "codex/event/turn-failed";

fn is_terminal_turn_event(event: &Event, turn_id: &str) -> bool {
    (event.name == TURN_COMPLETED || event.name == TURN_FAILED)
        && event.turn_id.as_deref().is_none_or(|id| id == turn_id)
}

/// Ensures `RemoveListener` runs exactly once on every return path out of
/// [`run_basic`], matching "listener is removed on return" (§4.I / §5).
struct ListenerGuard<'a> {
    session: &'a dyn Session,
    id: ListenerId,
}

impl Drop for ListenerGuard<'_> {
    fn drop(&mut self) {
        self.session.remove_listener(self.id);
    }
}

/// Run the six-step conformance check against `runtime`.
pub fn run_basic(runtime: &dyn Runtime, options: &RunBasicOptions) -> Result<RunBasicReport, RuntimeError> {
    // 1. Probe succeeds.
    runtime.probe()?;

    // 2. Every required capability is present.
    let missing = runtime.capabilities().missing(&options.required);
    if !missing.is_empty() {
        let names = missing.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        return Err(RuntimeError::new(
            RuntimeErrorKind::CapabilityUnsupported,
            format!("missing required capabilities: {names}"),
        )
        .with_strategy(runtime.id()));
    }

    // 3. Start a session; register a listener; ensure RemoveListener is callable.
    let session = runtime.start_session(SessionOptions::default())?;
    let (tx, rx) = mpsc::channel::<Event>();
    let listener_id = session.add_listener(Box::new(move |event| {
        let _ = tx.send(event.clone());
    }));
    let _guard = ListenerGuard {
        session: session.as_ref(),
        id: listener_id,
    };

    // 4. StartThread returns a non-empty threadId.
    let thread_id = session.start_thread()?;
    if thread_id.is_empty() {
        return Err(RuntimeError::new(RuntimeErrorKind::Protocol, "thread/start returned an empty threadId")
            .with_strategy(runtime.id()));
    }

    // 5. StartTurn with a small text input returns a non-empty turnId.
    let turn_id = session.start_turn(&thread_id, &options.turn_input)?;
    if turn_id.is_empty() {
        return Err(RuntimeError::new(RuntimeErrorKind::Protocol, "turn/start returned an empty turnId")
            .with_strategy(runtime.id()));
    }

    // 6. A terminal turn event arrives within eventTimeout, else timeout.
    let deadline = Instant::now() + options.event_timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Timeout,
                format!("no terminal turn event within {:?}", options.event_timeout),
            )
            .with_strategy(runtime.id()));
        }
        match rx.recv_timeout(remaining) {
            Ok(event) if is_terminal_turn_event(&event, &turn_id) => {
                return Ok(RunBasicReport {
                    thread_id,
                    turn_id,
                    terminal_event: event,
                });
            }
            Ok(_other_event) => continue,
            Err(RecvTimeoutError::Timeout) => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::Timeout,
                    format!("no terminal turn event within {:?}", options.event_timeout),
                )
                .with_strategy(runtime.id()));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::StreamDisconnect,
                    "event channel closed before a terminal turn event arrived",
                )
                .with_strategy(runtime.id()));
            }
        }
    }
}
