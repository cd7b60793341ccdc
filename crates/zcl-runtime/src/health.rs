//! Per-strategy health counters (spec.md §4.H "Health counters").
//!
//! Counters never decrement. Snapshots are deterministic sorted views
//! taken under a read lock over a copied per-strategy map, so two
//! snapshots taken back to back never observe a torn write.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// The bounded set of counters tracked per strategy id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Counter {
    SessionStart,
    SessionStartFail,
    SessionClosed,
    RequestSent,
    RequestFail,
    StreamDisconnect,
    RuntimeCrash,
    RateLimited,
    AuthFail,
    ListenerFailure,
    Interrupted,
    SchedulerWait,
}

impl Counter {
    pub const ALL: [Counter; 12] = [
        Counter::SessionStart,
        Counter::SessionStartFail,
        Counter::SessionClosed,
        Counter::RequestSent,
        Counter::RequestFail,
        Counter::StreamDisconnect,
        Counter::RuntimeCrash,
        Counter::RateLimited,
        Counter::AuthFail,
        Counter::ListenerFailure,
        Counter::Interrupted,
        Counter::SchedulerWait,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SessionStart => "session_start",
            Self::SessionStartFail => "session_start_fail",
            Self::SessionClosed => "session_closed",
            Self::RequestSent => "request_sent",
            Self::RequestFail => "request_fail",
            Self::StreamDisconnect => "stream_disconnect",
            Self::RuntimeCrash => "runtime_crash",
            Self::RateLimited => "rate_limited",
            Self::AuthFail => "auth_fail",
            Self::ListenerFailure => "listener_failure",
            Self::Interrupted => "interrupted",
            Self::SchedulerWait => "scheduler_wait",
        }
    }
}

struct StrategyCounters {
    values: Vec<AtomicU64>,
}

impl Default for StrategyCounters {
    fn default() -> Self {
        Self {
            values: (0..Counter::ALL.len()).map(|_| AtomicU64::new(0)).collect(),
        }
    }
}

impl StrategyCounters {
    fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        Counter::ALL
            .iter()
            .map(|c| (c.name(), self.values[*c as usize].load(Ordering::Relaxed)))
            .collect()
    }
}

/// Sink for per-strategy health counters. Increments are lock-free;
/// snapshotting briefly takes a read lock to materialize the strategy
/// map, then reads each atomic independently outside it.
#[derive(Default)]
pub struct HealthCounters {
    by_strategy: RwLock<BTreeMap<String, StrategyCounters>>,
}

impl HealthCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, strategy: &str, counter: Counter) {
        {
            let guard = self.by_strategy.read().expect("health counters poisoned");
            if let Some(entry) = guard.get(strategy) {
                entry.values[counter as usize].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        let mut guard = self.by_strategy.write().expect("health counters poisoned");
        guard
            .entry(strategy.to_string())
            .or_default()
            .values[counter as usize]
            .fetch_add(1, Ordering::Relaxed);
    }

    /// A deterministic, sorted-by-strategy-id snapshot of every counter
    /// for every strategy that has recorded at least one increment.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, BTreeMap<&'static str, u64>> {
        let guard = self.by_strategy.read().expect("health counters poisoned");
        guard
            .iter()
            .map(|(strategy, counters)| (strategy.clone(), counters.snapshot()))
            .collect()
    }
}
