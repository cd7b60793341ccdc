//! Error classification at the JSON-RPC boundary (spec.md §4.H).
//!
//! The server's own error taxonomy is not normative; the harness's is.
//! Messages are matched against deliberately loose heuristics so a wide
//! range of upstream wording still lands in the right bucket.

use zcl_runtime::RuntimeErrorKind;

const METHOD_NOT_FOUND: i64 = -32601;

const RATE_LIMIT_HINTS: &[&str] = &["rate limit", "usage limit", "quota", "429"];
const AUTH_HINTS: &[&str] = &["unauthorized", "forbidden", "authentication", "401", "403"];

/// Classify a JSON-RPC response error into the runtime error taxonomy.
#[must_use]
pub fn classify_rpc_error(code: i64, message: &str) -> RuntimeErrorKind {
    if code == METHOD_NOT_FOUND {
        return RuntimeErrorKind::Protocol;
    }
    let lower = message.to_lowercase();
    if RATE_LIMIT_HINTS.iter().any(|hint| lower.contains(hint)) {
        return RuntimeErrorKind::RateLimit;
    }
    if AUTH_HINTS.iter().any(|hint| lower.contains(hint)) {
        return RuntimeErrorKind::Auth;
    }
    RuntimeErrorKind::Protocol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_not_found_is_protocol() {
        assert_eq!(classify_rpc_error(-32601, "Method not found"), RuntimeErrorKind::Protocol);
    }

    #[test]
    fn rate_limit_hints_are_detected_case_insensitively() {
        assert_eq!(classify_rpc_error(-1, "Usage Limit exceeded"), RuntimeErrorKind::RateLimit);
        assert_eq!(classify_rpc_error(-1, "HTTP 429 too many requests"), RuntimeErrorKind::RateLimit);
    }

    #[test]
    fn auth_hints_are_detected() {
        assert_eq!(classify_rpc_error(-1, "401 Unauthorized"), RuntimeErrorKind::Auth);
        assert_eq!(classify_rpc_error(-1, "request was Forbidden"), RuntimeErrorKind::Auth);
    }

    #[test]
    fn unmatched_messages_default_to_protocol() {
        assert_eq!(classify_rpc_error(-32000, "internal server error"), RuntimeErrorKind::Protocol);
    }
}
