//! Newline-delimited JSON-RPC 2.0 wire types (spec.md §4.H).
//!
//! A line with `method` and no `id` is an event notification; a line
//! with `id` is a response (result or error). Everything else is a
//! protocol violation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An outbound request.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    #[must_use]
    pub fn new(id: String, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// An outbound notification (no reply expected, e.g. `initialized`).
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl OutgoingNotification {
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC error object as received in a response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A response's outcome: exactly one of `result`/`error`, per JSON-RPC.
#[derive(Debug, Clone)]
pub enum RpcOutcome {
    Result(Value),
    Error(RpcError),
}

/// A parsed response line.
#[derive(Debug, Clone)]
pub struct ResponseMessage {
    pub id: String,
    pub outcome: RpcOutcome,
}

/// A parsed notification line (an event).
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub method: String,
    pub params: Value,
}

/// Either shape a stdout line can take.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    Response(ResponseMessage),
    Notification(NotificationMessage),
}

/// Error parsing a raw stdout line as a JSON-RPC message.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("line has neither 'id' nor 'method'")]
    Unrecognized,
}

/// Bare-bones shape used only to distinguish responses from
/// notifications before fully deserializing either one.
#[derive(Debug, Deserialize)]
struct RawLine {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Parse one stdout line into a [`IncomingMessage`].
pub fn parse_line(line: &str) -> Result<IncomingMessage, ParseError> {
    let raw: RawLine = serde_json::from_str(line)?;

    if let Some(id) = raw.id {
        let id_str = match id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let outcome = match (raw.result, raw.error) {
            (_, Some(error)) => RpcOutcome::Error(error),
            (Some(result), None) => RpcOutcome::Result(result),
            (None, None) => RpcOutcome::Result(Value::Null),
        };
        return Ok(IncomingMessage::Response(ResponseMessage {
            id: id_str,
            outcome,
        }));
    }

    if let Some(method) = raw.method {
        return Ok(IncomingMessage::Notification(NotificationMessage {
            method,
            params: raw.params.unwrap_or(Value::Null),
        }));
    }

    Err(ParseError::Unrecognized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_result_response() {
        let line = r#"{"jsonrpc":"2.0","id":"1","result":{"userAgent":"codex-cli/1.4.2"}}"#;
        match parse_line(line).unwrap() {
            IncomingMessage::Response(resp) => {
                assert_eq!(resp.id, "1");
                assert!(matches!(resp.outcome, RpcOutcome::Result(_)));
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn parses_error_response() {
        let line = r#"{"jsonrpc":"2.0","id":"2","error":{"code":-32601,"message":"method not found"}}"#;
        match parse_line(line).unwrap() {
            IncomingMessage::Response(resp) => match resp.outcome {
                RpcOutcome::Error(err) => assert_eq!(err.code, -32601),
                _ => panic!("expected error outcome"),
            },
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn parses_notification() {
        let line = r#"{"jsonrpc":"2.0","method":"codex.turnCompleted","params":{"turnId":"t1"}}"#;
        match parse_line(line).unwrap() {
            IncomingMessage::Notification(note) => {
                assert_eq!(note.method, "codex.turnCompleted");
                assert_eq!(note.params["turnId"], "t1");
            }
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn rejects_line_without_id_or_method() {
        let line = r#"{"jsonrpc":"2.0"}"#;
        assert!(matches!(parse_line(line), Err(ParseError::Unrecognized)));
    }
}
