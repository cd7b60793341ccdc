//! Structured logging bootstrap shared by every `zcl` binary entry point.
//!
//! Level is controlled by `RUST_LOG` if set, falling back to `ZCL_LOG`,
//! falling back to `info` (or `debug` when `verbose` is requested).

use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber. Safe to call once per
/// process; a second call returns an error that callers may ignore.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| std::env::var("ZCL_LOG").map(EnvFilter::new))
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("zcl=debug,info")
            } else {
                EnvFilter::try_new("zcl=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}

/// Open a span for one attempt's lifetime, carrying the ids that every
/// log line inside the span should be attributed to.
pub fn attempt_span(run_id: &str, attempt_id: &str) -> tracing::Span {
    tracing::info_span!("attempt", run_id, attempt_id)
}

/// Open a span for one adapter session, carrying the strategy id.
pub fn session_span(strategy_id: &str) -> tracing::Span {
    tracing::info_span!("runtime_session", strategy_id)
}
