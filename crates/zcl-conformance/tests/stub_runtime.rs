//! A minimal `Runtime` fixture used to prove `run_basic` actually
//! enforces each of the six steps rather than rubber-stamping any
//! adapter handed to it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use zcl_conformance::{run_basic, RunBasicOptions};
use zcl_runtime::{
    Capability, CapabilitySet, Event, ListenerId, Runtime, RuntimeError, RuntimeErrorKind, Session,
    SessionOptions,
};

/// A fully conformant runtime: starts a thread/turn synchronously and
/// fires a `turn_completed` event to every listener before `start_turn`
/// returns.
struct StubRuntime {
    capabilities: CapabilitySet,
}

impl StubRuntime {
    fn conformant() -> Self {
        Self {
            capabilities: CapabilitySet::conformance_default(),
        }
    }

    fn missing_interrupt() -> Self {
        Self {
            capabilities: CapabilitySet::from_iter([Capability::ThreadStart, Capability::EventStream]),
        }
    }
}

impl Runtime for StubRuntime {
    fn id(&self) -> &str {
        "stub"
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    fn probe(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn start_session(&self, _opts: SessionOptions) -> Result<Box<dyn Session>, RuntimeError> {
        Ok(Box::new(StubSession {
            listeners: std::sync::Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            fire_terminal_event: true,
        }))
    }
}

/// A runtime whose turns never complete, to exercise the `eventTimeout`
/// path.
struct SilentRuntime;

impl Runtime for SilentRuntime {
    fn id(&self) -> &str {
        "silent"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::conformance_default()
    }

    fn probe(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn start_session(&self, _opts: SessionOptions) -> Result<Box<dyn Session>, RuntimeError> {
        Ok(Box::new(StubSession {
            listeners: std::sync::Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            fire_terminal_event: false,
        }))
    }
}

struct StubSession {
    listeners: std::sync::Mutex<Vec<(u64, Box<dyn Fn(&Event) + Send + Sync>)>>,
    next_listener_id: AtomicU64,
    fire_terminal_event: bool,
}

impl Session for StubSession {
    fn runtime_id(&self) -> &str {
        "stub"
    }

    fn session_id(&self) -> &str {
        "stub-session-1"
    }

    fn current_thread_id(&self) -> Option<String> {
        None
    }

    fn start_thread(&self) -> Result<String, RuntimeError> {
        Ok("thread-1".to_string())
    }

    fn resume_thread(&self, _thread_id: &str) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn start_turn(&self, _thread_id: &str, _input: &str) -> Result<String, RuntimeError> {
        let turn_id = "turn-1".to_string();
        if self.fire_terminal_event {
            let event = Event::from_notification(
                "turn_completed",
                serde_json::json!({ "turnId": turn_id }),
            );
            for (_, listener) in self.listeners.lock().expect("listeners poisoned").iter() {
                listener(&event);
            }
        }
        Ok(turn_id)
    }

    fn steer_turn(&self, _turn_id: &str, _input: &str) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn interrupt_turn(&self, _turn_id: &str) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn add_listener(&self, listener: Box<dyn Fn(&Event) + Send + Sync>) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().expect("listeners poisoned").push((id, listener));
        ListenerId(id)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().expect("listeners poisoned");
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id.0);
        listeners.len() != before
    }

    fn close(&self, _timeout: Duration) -> Result<(), RuntimeError> {
        Ok(())
    }
}

#[test]
fn conformant_runtime_passes_run_basic() {
    let runtime = StubRuntime::conformant();
    let report = run_basic(&runtime, &RunBasicOptions::default()).expect("stub should pass RunBasic");
    assert_eq!(report.thread_id, "thread-1");
    assert_eq!(report.turn_id, "turn-1");
    assert_eq!(report.terminal_event.name, "codex/event/turn-completed");
}

#[test]
fn missing_required_capability_fails_before_starting_a_session() {
    let runtime = StubRuntime::missing_interrupt();
    let err = run_basic(&runtime, &RunBasicOptions::default()).expect_err("missing interrupt should fail");
    assert_eq!(err.kind, RuntimeErrorKind::CapabilityUnsupported);
}

#[test]
fn no_terminal_event_within_timeout_fails_as_timeout() {
    let runtime = SilentRuntime;
    let options = RunBasicOptions {
        event_timeout: Duration::from_millis(50),
        ..RunBasicOptions::default()
    };
    let err = run_basic(&runtime, &options).expect_err("silent runtime should time out");
    assert_eq!(err.kind, RuntimeErrorKind::Timeout);
}
