//! The concrete JSON-RPC stdio adapter (component H, spec.md §4.H).
//!
//! Spawns a long-lived child speaking newline-delimited JSON-RPC on
//! stdin/stdout. A single reader thread owns stdout: responses route to
//! the waiting caller via a one-shot channel, notifications fan out to
//! every registered listener. Writes are serialized through a mutex so
//! the child always sees requests in the harness's call order.
//!
//! Named `CodexLikeAdapter` rather than after any specific vendor binary:
//! the spec treats "today: one concrete adapter" as an implementation
//! detail, not a contract.

pub mod child;
pub mod classify;
pub mod protocol;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

use serde_json::{json, Value};

use zcl_envpolicy::EnvPolicy;
use zcl_runtime::{
    Capability, CapabilitySet, Event, HealthCounters, ListenerId, ProtocolContract, Runtime,
    RuntimeError, RuntimeErrorKind, Session, SessionOptions, UserAgent,
    health::Counter,
};

use child::{ChildProcess, RealChildProcess};
use protocol::{IncomingMessage, OutgoingNotification, Request, RpcOutcome};

/// Default per-request timeout applied when the caller supplies none.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default budget `Close` waits for a graceful child exit before killing it.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Grace period after `Kill` before giving up on the wait.
pub const HARD_KILL_GRACE: Duration = Duration::from_millis(750);

type SpawnFn = dyn Fn(&str, &[String], &BTreeMap<String, String>) -> std::io::Result<Box<dyn ChildProcess>>
    + Send
    + Sync;

/// Static configuration for one [`CodexLikeAdapter`] instance.
pub struct AdapterConfig {
    pub strategy_id: String,
    pub command: String,
    pub args: Vec<String>,
    pub env_policy: EnvPolicy,
    pub contract: ProtocolContract,
    pub request_timeout: Duration,
    pub shutdown_timeout: Duration,
}

/// A pluggable JSON-RPC-over-stdio [`Runtime`].
pub struct CodexLikeAdapter {
    config: AdapterConfig,
    health: Arc<HealthCounters>,
    spawn: Box<SpawnFn>,
    session_counter: AtomicU64,
}

impl CodexLikeAdapter {
    /// Build an adapter that spawns real OS child processes.
    #[must_use]
    pub fn new(config: AdapterConfig, health: Arc<HealthCounters>) -> Self {
        Self::with_spawn_fn(
            config,
            health,
            Box::new(|command, args, env| {
                RealChildProcess::spawn(command, args, env)
                    .map(|child| Box::new(child) as Box<dyn ChildProcess>)
            }),
        )
    }

    /// Build an adapter with an injectable spawn function, so the
    /// multiplexing/event-fan-out/termination logic can be driven against
    /// a fake in-memory child in tests without touching a real process.
    #[must_use]
    pub fn with_spawn_fn(
        config: AdapterConfig,
        health: Arc<HealthCounters>,
        spawn: Box<SpawnFn>,
    ) -> Self {
        Self {
            config,
            health,
            spawn,
            session_counter: AtomicU64::new(0),
        }
    }
}

impl Runtime for CodexLikeAdapter {
    fn id(&self) -> &str {
        &self.config.strategy_id
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::from_iter([
            Capability::ThreadStart,
            Capability::TurnSteer,
            Capability::Interrupt,
            Capability::EventStream,
            Capability::ParallelSessions,
        ])
    }

    fn probe(&self) -> Result<(), RuntimeError> {
        if child::command_is_resolvable(&self.config.command) {
            Ok(())
        } else {
            Err(RuntimeError::new(
                RuntimeErrorKind::Startup,
                format!("command '{}' is not an existing absolute path or a name on PATH", self.config.command),
            )
            .with_strategy(self.config.strategy_id.clone()))
        }
    }

    fn start_session(&self, opts: SessionOptions) -> Result<Box<dyn Session>, RuntimeError> {
        let strategy = self.config.strategy_id.clone();
        let result = self.start_session_inner(opts);
        if result.is_err() {
            self.health.increment(&strategy, Counter::SessionStartFail);
        } else {
            self.health.increment(&strategy, Counter::SessionStart);
        }
        result
    }
}

impl CodexLikeAdapter {
    fn start_session_inner(&self, opts: SessionOptions) -> Result<Box<dyn Session>, RuntimeError> {
        self.probe()?;

        // Build and filter the child environment (§4.C, §4.H step 2).
        let mut merged: BTreeMap<String, String> = std::env::vars().collect();
        for (k, v) in &opts.env {
            merged.insert(k.clone(), v.clone());
        }
        for (k, v) in &opts.extras {
            merged.insert(k.clone(), v.clone());
        }
        for key in opts.env.keys().chain(opts.extras.keys()) {
            self.config
                .env_policy
                .check_explicit(key)
                .map_err(|e| RuntimeError::new(RuntimeErrorKind::EnvPolicy, e.to_string()))?;
        }
        let filtered = self
            .config
            .env_policy
            .filter_or_refuse(&merged)
            .map_err(|e| RuntimeError::new(RuntimeErrorKind::EnvPolicy, e.to_string()))?;

        let child = (self.spawn)(&self.config.command, &self.config.args, &filtered).map_err(|e| {
            RuntimeError::new(RuntimeErrorKind::Startup, format!("failed to spawn child: {e}"))
                .with_strategy(self.config.strategy_id.clone())
        })?;

        let inner = Arc::new(Inner {
            strategy_id: self.config.strategy_id.clone(),
            session_id: format!(
                "{}-{:08x}",
                self.config.strategy_id,
                self.session_counter.fetch_add(1, Ordering::Relaxed)
            ),
            child,
            write_mutex: std::sync::Mutex::new(()),
            next_request_id: AtomicU64::new(1),
            pending: std::sync::Mutex::new(BTreeMap::new()),
            listeners: RwLock::new(BTreeMap::new()),
            next_listener_id: AtomicU64::new(1),
            current_thread_id: std::sync::Mutex::new(None),
            closing: AtomicBool::new(false),
            terminal: OnceLock::new(),
            health: self.health.clone(),
            request_timeout: self.config.request_timeout,
            shutdown_timeout: self.config.shutdown_timeout,
        });

        let reader_inner = inner.clone();
        std::thread::Builder::new()
            .name(format!("zcl-rpc-reader-{}", inner.session_id))
            .spawn(move || run_read_loop(reader_inner))
            .map_err(|e| {
                RuntimeError::new(RuntimeErrorKind::Startup, format!("failed to spawn reader thread: {e}"))
            })?;

        // Step 4: initialize.
        let init_result = inner.call(
            "initialize",
            Some(json!({ "client": { "name": "zcl", "version": env!("CARGO_PKG_VERSION") } })),
            None,
        )?;
        if init_result.get("userAgent").and_then(Value::as_str).is_none() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Protocol,
                "initialize response missing userAgent",
            )
            .with_strategy(self.config.strategy_id.clone()));
        }
        inner.notify("initialized", None)?;

        // Step 5: compat probe via model/list, then semver/protocol check.
        match inner.call("model/list", Some(json!({})), None) {
            Ok(_) => {}
            Err(err) if err.message.contains("-32601") => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::Compatibility,
                    "runtime does not implement model/list (protocol too old)",
                )
                .with_strategy(self.config.strategy_id.clone()));
            }
            Err(err) => return Err(err),
        }

        let user_agent_str = init_result
            .get("userAgent")
            .and_then(Value::as_str)
            .expect("checked above");
        let user_agent = UserAgent::parse(user_agent_str).ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::Protocol,
                format!("unparseable userAgent '{user_agent_str}'"),
            )
        })?;
        if !self.config.contract.is_satisfied_by(&user_agent) {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Compatibility,
                format!("runtime '{user_agent_str}' is below the configured minimum"),
            )
            .with_strategy(self.config.strategy_id.clone()));
        }

        Ok(Box::new(CodexSession { inner }))
    }
}

struct Inner {
    strategy_id: String,
    session_id: String,
    child: Box<dyn ChildProcess>,
    write_mutex: std::sync::Mutex<()>,
    next_request_id: AtomicU64,
    pending: std::sync::Mutex<BTreeMap<String, Sender<Result<Value, RuntimeError>>>>,
    listeners: RwLock<BTreeMap<u64, Box<dyn Fn(&Event) + Send + Sync>>>,
    next_listener_id: AtomicU64,
    current_thread_id: std::sync::Mutex<Option<String>>,
    closing: AtomicBool,
    terminal: OnceLock<TerminalState>,
    health: Arc<HealthCounters>,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

struct TerminalState {
    kind: Option<RuntimeErrorKind>,
    message: String,
}

impl Inner {
    fn terminal_error(&self) -> Option<RuntimeError> {
        self.terminal.get().map(|t| match t.kind {
            Some(kind) => RuntimeError::new(kind, t.message.clone()).with_strategy(self.strategy_id.clone()),
            None => RuntimeError::new(RuntimeErrorKind::Transport, t.message.clone())
                .with_strategy(self.strategy_id.clone()),
        })
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.write_mutex.lock().expect("write mutex poisoned");
        self.child.write_line(line)
    }

    fn notify(&self, method: &str, params: Option<Value>) -> Result<(), RuntimeError> {
        let note = OutgoingNotification::new(method, params);
        let line = serde_json::to_string(&note)
            .map_err(|e| RuntimeError::new(RuntimeErrorKind::Protocol, e.to_string()))?;
        self.write_line(&line)
            .map_err(|e| RuntimeError::new(RuntimeErrorKind::Transport, e.to_string()))
    }

    fn call(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Value, RuntimeError> {
        if let Some(err) = self.terminal_error() {
            return Err(err);
        }

        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed).to_string();
        let (tx, rx) = mpsc::channel();
        self.pending.lock().expect("pending mutex poisoned").insert(id.clone(), tx);

        let request = Request::new(id.clone(), method, params);
        let line = match serde_json::to_string(&request) {
            Ok(l) => l,
            Err(e) => {
                self.pending.lock().expect("pending mutex poisoned").remove(&id);
                return Err(RuntimeError::new(RuntimeErrorKind::Protocol, e.to_string()));
            }
        };

        self.health.increment(&self.strategy_id, Counter::RequestSent);
        if let Err(e) = self.write_line(&line) {
            self.pending.lock().expect("pending mutex poisoned").remove(&id);
            self.health.increment(&self.strategy_id, Counter::RequestFail);
            return Err(RuntimeError::new(RuntimeErrorKind::Transport, e.to_string()));
        }

        let effective_timeout = timeout.unwrap_or(self.request_timeout);
        match rx.recv_timeout(effective_timeout) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                self.health.increment(&self.strategy_id, Counter::RequestFail);
                Err(err)
            }
            Err(RecvTimeoutError::Timeout) => {
                self.pending.lock().expect("pending mutex poisoned").remove(&id);
                self.health.increment(&self.strategy_id, Counter::RequestFail);
                Err(RuntimeError::new(RuntimeErrorKind::Timeout, format!("{method} timed out")))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.health.increment(&self.strategy_id, Counter::RequestFail);
                Err(self
                    .terminal_error()
                    .unwrap_or_else(|| RuntimeError::new(RuntimeErrorKind::Transport, "reply channel dropped")))
            }
        }
    }

    /// Invoke every listener with `event`, stopping (and reporting) at
    /// the first panic. Returns `true` if a listener panicked.
    fn fan_out(&self, event: &Event) -> bool {
        let listeners = self.listeners.read().expect("listeners lock poisoned");
        for f in listeners.values() {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(event))).is_err() {
                return true;
            }
        }
        false
    }

    /// One-shot transition to done. `kind = None` means a clean,
    /// caller-initiated close; no synthetic event is dispatched for
    /// that case. Returns `true` if this call performed the transition.
    fn transition_done(&self, kind: Option<RuntimeErrorKind>, message: impl Into<String>) -> bool {
        let message = message.into();
        if self
            .terminal
            .set(TerminalState { kind, message: message.clone() })
            .is_err()
        {
            return false;
        }

        if let Some(name) = match kind {
            Some(RuntimeErrorKind::Crash) => Some(zcl_runtime::event::EVENT_RUNTIME_CRASHED),
            Some(RuntimeErrorKind::StreamDisconnect) => Some(zcl_runtime::event::EVENT_STREAM_DISCONNECTED),
            _ => None,
        } {
            let code = kind.expect("name implies kind").code();
            let event = Event::synthetic_terminal(name, code, &message);
            let _ = self.fan_out(&event);
        }

        let pending = {
            let mut guard = self.pending.lock().expect("pending mutex poisoned");
            std::mem::take(&mut *guard)
        };
        for (_, sender) in pending {
            let err = match kind {
                Some(k) => RuntimeError::new(k, message.clone()),
                None => RuntimeError::new(RuntimeErrorKind::Transport, "session closed".to_string()),
            };
            let _ = sender.send(Err(err));
        }

        self.listeners.write().expect("listeners lock poisoned").clear();
        true
    }
}

fn run_read_loop(inner: Arc<Inner>) {
    loop {
        match inner.child.read_line() {
            Ok(Some(line)) => match protocol::parse_line(&line) {
                Ok(IncomingMessage::Response(resp)) => {
                    let sender = inner.pending.lock().expect("pending mutex poisoned").remove(&resp.id);
                    if let Some(sender) = sender {
                        let result = match resp.outcome {
                            RpcOutcome::Result(v) => Ok(v),
                            RpcOutcome::Error(e) => {
                                let kind = classify::classify_rpc_error(e.code, &e.message);
                                Err(RuntimeError::new(kind, format!("rpc error {}: {}", e.code, e.message)))
                            }
                        };
                        let _ = sender.send(result);
                    }
                    // Unknown id: silently discarded, per the spec's boundary behavior.
                }
                Ok(IncomingMessage::Notification(note)) => {
                    let event = Event::from_notification(&note.method, note.params);
                    if inner.fan_out(&event) {
                        inner.health.increment(&inner.strategy_id, Counter::ListenerFailure);
                        inner.transition_done(Some(RuntimeErrorKind::ListenerFailure), "listener panicked");
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(strategy = %inner.strategy_id, error = %e, "discarding unparseable stdout line");
                }
            },
            Ok(None) => {
                if inner.closing.load(Ordering::SeqCst) {
                    inner.transition_done(None, "stdout closed during shutdown");
                } else {
                    inner.health.increment(&inner.strategy_id, Counter::RuntimeCrash);
                    inner.transition_done(Some(RuntimeErrorKind::Crash), "child closed stdout unexpectedly");
                }
                return;
            }
            Err(e) => {
                inner.health.increment(&inner.strategy_id, Counter::StreamDisconnect);
                inner.transition_done(
                    Some(RuntimeErrorKind::StreamDisconnect),
                    format!("stdout read error: {e}"),
                );
                return;
            }
        }
    }
}

/// A live session against a [`CodexLikeAdapter`]-spawned child.
struct CodexSession {
    inner: Arc<Inner>,
}

impl Session for CodexSession {
    fn runtime_id(&self) -> &str {
        &self.inner.strategy_id
    }

    fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    fn current_thread_id(&self) -> Option<String> {
        self.inner.current_thread_id.lock().expect("thread id mutex poisoned").clone()
    }

    fn start_thread(&self) -> Result<String, RuntimeError> {
        let result = self.inner.call("thread/start", Some(json!({})), None)?;
        let thread_id = result
            .get("threadId")
            .and_then(Value::as_str)
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::Protocol, "thread/start missing threadId"))?
            .to_string();
        *self.inner.current_thread_id.lock().expect("thread id mutex poisoned") = Some(thread_id.clone());
        Ok(thread_id)
    }

    fn resume_thread(&self, thread_id: &str) -> Result<(), RuntimeError> {
        self.inner
            .call("thread/resume", Some(json!({ "threadId": thread_id })), None)?;
        *self.inner.current_thread_id.lock().expect("thread id mutex poisoned") = Some(thread_id.to_string());
        Ok(())
    }

    fn start_turn(&self, thread_id: &str, input: &str) -> Result<String, RuntimeError> {
        let result = self.inner.call(
            "turn/start",
            Some(json!({ "threadId": thread_id, "input": input })),
            None,
        )?;
        result
            .get("turnId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::Protocol, "turn/start missing turnId"))
    }

    fn steer_turn(&self, turn_id: &str, input: &str) -> Result<(), RuntimeError> {
        self.inner
            .call("turn/steer", Some(json!({ "turnId": turn_id, "input": input })), None)?;
        Ok(())
    }

    fn interrupt_turn(&self, turn_id: &str) -> Result<(), RuntimeError> {
        self.inner
            .call("turn/interrupt", Some(json!({ "turnId": turn_id })), None)?;
        self.inner.health.increment(&self.inner.strategy_id, Counter::Interrupted);
        Ok(())
    }

    fn add_listener(&self, listener: Box<dyn Fn(&Event) + Send + Sync>) -> ListenerId {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .write()
            .expect("listeners lock poisoned")
            .insert(id, listener);
        ListenerId(id)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner
            .listeners
            .write()
            .expect("listeners lock poisoned")
            .remove(&id.0)
            .is_some()
    }

    fn close(&self, timeout: Duration) -> Result<(), RuntimeError> {
        if self.inner.closing.swap(true, Ordering::SeqCst) {
            return match self.inner.terminal_error() {
                Some(err) => Err(err),
                None => Ok(()),
            };
        }

        let _ = self.inner.child.close_stdin();
        let effective = timeout.min(self.inner.shutdown_timeout);

        match self.inner.child.wait_timeout(effective) {
            Ok(Some(_exit_code)) => {
                self.inner.transition_done(None, "child exited after stdin close");
                self.inner.health.increment(&self.inner.strategy_id, Counter::SessionClosed);
                Ok(())
            }
            Ok(None) => {
                let _ = self.inner.child.kill();
                let _ = self.inner.child.wait_timeout(HARD_KILL_GRACE);
                self.inner
                    .transition_done(Some(RuntimeErrorKind::Timeout), "shutdown timed out; child was killed");
                Err(RuntimeError::new(
                    RuntimeErrorKind::Timeout,
                    "shutdown timed out; child was killed",
                ))
            }
            Err(e) => {
                self.inner
                    .transition_done(Some(RuntimeErrorKind::Transport), e.to_string());
                Err(RuntimeError::new(RuntimeErrorKind::Transport, e.to_string()))
            }
        }
    }
}
