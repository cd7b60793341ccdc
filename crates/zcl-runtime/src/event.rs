//! The event envelope fanned out to session listeners (spec.md §4.H
//! "Event dispatch").

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Namespace every normalized event name is rewritten into:
/// `codex/event/<kebab>`.
pub const EVENT_NAMESPACE: &str = "codex/event";

/// Synthetic terminal events dispatched once a session goes `done`.
pub const EVENT_RUNTIME_CRASHED: &str = "codex/event/runtime_crashed";
pub const EVENT_STREAM_DISCONNECTED: &str = "codex/event/stream_disconnected";

/// A single fanned-out event. `raw` is passed through verbatim for full
/// fidelity; the named fields are extracted convenience accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    pub raw: Value,
}

impl Event {
    /// Build an event from a raw JSON-RPC notification payload, rewriting
    /// `method` into the `codex/event/<kebab>` namespace and pulling out
    /// the well-known correlation ids when present.
    #[must_use]
    pub fn from_notification(method: &str, raw: Value) -> Self {
        Self {
            name: normalize_event_name(method),
            thread_id: string_field(&raw, "threadId"),
            turn_id: string_field(&raw, "turnId"),
            item_id: string_field(&raw, "itemId"),
            call_id: string_field(&raw, "callId"),
            raw,
        }
    }

    /// Build one of the two synthetic terminal events dispatched exactly
    /// once when a session transitions to done.
    #[must_use]
    pub fn synthetic_terminal(name: &'static str, code: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            thread_id: None,
            turn_id: None,
            item_id: None,
            call_id: None,
            raw: serde_json::json!({ "code": code, "message": message }),
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}

/// Rewrite a raw method name (e.g. `codex.turnCompleted`, `turn/completed`)
/// into the `codex/event/<kebab>` namespace. A `.`-delimited namespace
/// prefix is dropped (only the segment after the last `.` is kept); any
/// remaining `/`-delimited path is kebab-joined in full so that, e.g.,
/// `turn/completed` and `item/completed` normalize to distinct names
/// rather than colliding on their shared last segment.
#[must_use]
pub fn normalize_event_name(method: &str) -> String {
    let tail = method.rsplit('.').next().unwrap_or(method);
    format!("{EVENT_NAMESPACE}/{}", to_kebab(tail))
}

fn to_kebab(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i != 0 {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
        } else if ch == '_' || ch == '/' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_camel_case_method_into_kebab_namespace() {
        assert_eq!(
            normalize_event_name("codex.turnCompleted"),
            "codex/event/turn-completed"
        );
    }

    #[test]
    fn normalizes_snake_case_method() {
        assert_eq!(
            normalize_event_name("turn_failed"),
            "codex/event/turn-failed"
        );
    }

    #[test]
    fn slash_delimited_methods_keep_their_category_and_do_not_collide() {
        assert_eq!(
            normalize_event_name("turn/completed"),
            "codex/event/turn-completed"
        );
        assert_eq!(
            normalize_event_name("item/completed"),
            "codex/event/item-completed"
        );
        assert_ne!(
            normalize_event_name("turn/completed"),
            normalize_event_name("item/completed")
        );
    }

    #[test]
    fn extracts_known_correlation_ids() {
        let raw = json!({"threadId": "t1", "turnId": "u1", "callId": "c1"});
        let event = Event::from_notification("codex.itemUpdated", raw);
        assert_eq!(event.thread_id.as_deref(), Some("t1"));
        assert_eq!(event.turn_id.as_deref(), Some("u1"));
        assert_eq!(event.call_id.as_deref(), Some("c1"));
        assert!(event.item_id.is_none());
    }
}
