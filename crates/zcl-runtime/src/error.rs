//! The closed runtime error taxonomy (spec.md §7).

use std::fmt;

/// One of the fourteen closed error kinds a runtime/session/resolver
/// operation can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UnsupportedStrategy,
    StrategyUnavailable,
    CapabilityUnsupported,
    Compatibility,
    Startup,
    Transport,
    Protocol,
    Timeout,
    StreamDisconnect,
    EnvPolicy,
    Auth,
    RateLimit,
    ListenerFailure,
    Crash,
}

impl RuntimeErrorKind {
    /// Stable wire identifier, e.g. for `ZCL_E_*`-style codes.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::UnsupportedStrategy => "unsupported_strategy",
            Self::StrategyUnavailable => "strategy_unavailable",
            Self::CapabilityUnsupported => "capability_unsupported",
            Self::Compatibility => "compatibility",
            Self::Startup => "startup",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Timeout => "timeout",
            Self::StreamDisconnect => "stream_disconnect",
            Self::EnvPolicy => "env_policy",
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::ListenerFailure => "listener_failure",
            Self::Crash => "crash",
        }
    }

    /// Default retryability per the spec's table. `None` ("maybe") means
    /// the caller should consult context rather than a fixed default.
    #[must_use]
    pub fn default_retryable(self) -> Option<bool> {
        match self {
            Self::UnsupportedStrategy => Some(false),
            Self::StrategyUnavailable => Some(true),
            Self::CapabilityUnsupported => Some(false),
            Self::Compatibility => Some(false),
            Self::Startup => None,
            Self::Transport => Some(true),
            Self::Protocol => None,
            Self::Timeout => Some(true),
            Self::StreamDisconnect => Some(true),
            Self::EnvPolicy => Some(false),
            Self::Auth => None,
            Self::RateLimit => Some(true),
            Self::ListenerFailure => Some(false),
            Self::Crash => Some(true),
        }
    }
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One strategy's resolution failure, accumulated (never swallowed) by
/// the resolver.
#[derive(Debug, Clone)]
pub struct StrategyFailure {
    pub strategy: String,
    pub kind: RuntimeErrorKind,
    pub message: String,
}

/// The error type crossing every public boundary in the runtime
/// abstraction.
#[derive(Debug)]
pub struct RuntimeError {
    pub code: String,
    pub kind: RuntimeErrorKind,
    pub strategy: Option<String>,
    pub message: String,
    pub retryable: Option<bool>,
    pub failures: Vec<StrategyFailure>,
    pub underlying: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RuntimeError {
    #[must_use]
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            code: kind.code().to_string(),
            retryable: kind.default_retryable(),
            kind,
            strategy: None,
            message: message.into(),
            failures: Vec::new(),
            underlying: None,
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    #[must_use]
    pub fn with_failures(mut self, failures: Vec<StrategyFailure>) -> Self {
        self.failures = failures;
        self
    }

    #[must_use]
    pub fn with_underlying(
        mut self,
        underlying: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.underlying = Some(Box::new(underlying));
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.underlying
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_error_picks_up_default_retryable() {
        let err = RuntimeError::new(RuntimeErrorKind::RateLimit, "quota exceeded");
        assert_eq!(err.code, "rate_limit");
        assert_eq!(err.retryable, Some(true));
    }

    #[test]
    fn startup_has_no_fixed_default_retryable() {
        assert_eq!(RuntimeErrorKind::Startup.default_retryable(), None);
    }

    #[test]
    fn with_strategy_and_failures_round_trip() {
        let failures = vec![StrategyFailure {
            strategy: "codex".to_string(),
            kind: RuntimeErrorKind::CapabilityUnsupported,
            message: "missing interrupt".to_string(),
        }];
        let err = RuntimeError::new(RuntimeErrorKind::StrategyUnavailable, "none passed")
            .with_strategy("codex")
            .with_failures(failures.clone());
        assert_eq!(err.strategy.as_deref(), Some("codex"));
        assert_eq!(err.failures.len(), 1);
    }
}
