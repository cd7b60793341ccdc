//! Identifier allocation and canonicalization (component A).
//!
//! `runId` and `attemptId` grammars, and the single accepted path for
//! turning an external string into a filesystem-safe canonical component.

use chrono::{DateTime, Utc};
use rand::Rng;

/// `runId` grammar: `YYYYMMDD-HHMMSSZ-<hex6>`.
const RUN_ID_HEX_LEN: usize = 6;

/// Allocate a fresh `runId` for `now`, drawing the hex suffix from a fresh
/// random source. Uniqueness within a clock second is guaranteed by the
/// suffix, not the timestamp.
#[must_use]
pub fn new_run_id(now: DateTime<Utc>) -> String {
    let suffix = random_hex(RUN_ID_HEX_LEN);
    format!("{}-{suffix}", now.format("%Y%m%d-%H%M%SZ"))
}

fn random_hex(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| std::char::from_digit(rng.random_range(0..16), 16).unwrap())
        .collect()
}

/// Strictly validate the `runId` grammar: `YYYYMMDD-HHMMSSZ-<hex6>`.
#[must_use]
pub fn is_valid_run_id(id: &str) -> bool {
    let Some((date_part, rest)) = id.split_once('-') else {
        return false;
    };
    let Some((time_part, hex_part)) = rest.split_once('-') else {
        return false;
    };

    date_part.len() == 8
        && date_part.bytes().all(|b| b.is_ascii_digit())
        && time_part.len() == 7
        && time_part.ends_with('Z')
        && time_part[..6].bytes().all(|b| b.is_ascii_digit())
        && hex_part.len() == RUN_ID_HEX_LEN
        && hex_part.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Canonicalize a component (mission id, suite id, ...) into the
/// lowercase-kebab grammar accepted on filesystem paths: lowercase,
/// `[a-z0-9-]`, runs of other characters collapse to a single `-`,
/// leading/trailing `-` trimmed. Empty input (or input that canonicalizes
/// to empty) is rejected.
///
/// Idempotent: `sanitize_component(sanitize_component(x)) ==
/// sanitize_component(x)` for all `x`.
pub fn sanitize_component(raw: &str) -> Result<String, SanitizeError> {
    let lowered = raw.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_dash = false;

    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' {
            if ch == '-' {
                if !last_was_dash && !out.is_empty() {
                    out.push('-');
                }
                last_was_dash = true;
            } else {
                out.push(ch);
                last_was_dash = false;
            }
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }

    while out.ends_with('-') {
        out.pop();
    }

    if out.is_empty() {
        return Err(SanitizeError::Empty {
            input: raw.to_string(),
        });
    }

    Ok(out)
}

/// Error returned when a component cannot be sanitized into a non-empty
/// canonical form.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SanitizeError {
    /// The input was empty, or contained only characters that collapse
    /// away (whitespace, punctuation) under canonicalization.
    #[error("component '{input}' sanitizes to an empty string")]
    Empty {
        /// The original, un-sanitized input.
        input: String,
    },
}

/// Format an `attemptId`: `NNN-<canonical-mission>-r<retry>`. `ordinal` is
/// the zero-padded 1-based ordinal; callers compute it as
/// `count_child_dirs(attempts) + 1`.
#[must_use]
pub fn format_attempt_id(ordinal: u32, canonical_mission: &str, retry: u32) -> String {
    format!("{ordinal:03}-{canonical_mission}-r{retry}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn new_run_id_is_valid() {
        let now = Utc.with_ymd_and_hms(2026, 2, 15, 18, 0, 12).unwrap();
        let id = new_run_id(now);
        assert!(is_valid_run_id(&id), "{id} should be a valid run id");
        assert!(id.starts_with("20260215-180012Z-"));
    }

    #[test]
    fn rejects_malformed_run_ids() {
        assert!(!is_valid_run_id(""));
        assert!(!is_valid_run_id("20260215-180012Z"));
        assert!(!is_valid_run_id("20260215-180012Z-zzzzzz"));
        assert!(!is_valid_run_id("2026021-180012Z-09c5a6"));
    }

    #[test]
    fn sanitize_collapses_and_trims() {
        assert_eq!(
            sanitize_component("Latest Blog Title!!").unwrap(),
            "latest-blog-title"
        );
        assert_eq!(
            sanitize_component("  --Heftiweb Smoke--  ").unwrap(),
            "heftiweb-smoke"
        );
    }

    #[test]
    fn sanitize_rejects_empty() {
        assert!(sanitize_component("").is_err());
        assert!(sanitize_component("   ...   ").is_err());
    }

    #[test]
    fn attempt_id_format() {
        assert_eq!(
            format_attempt_id(1, "latest-blog-title", 1),
            "001-latest-blog-title-r1"
        );
        assert_eq!(
            format_attempt_id(42, "smoke", 3),
            "042-smoke-r3"
        );
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(s in ".{0,64}") {
            if let Ok(once) = sanitize_component(&s) {
                let twice = sanitize_component(&once).expect("already-canonical input re-sanitizes");
                prop_assert_eq!(once, twice);
            }
        }

        #[test]
        fn sanitized_output_is_canonical_alphabet(s in ".{1,64}") {
            if let Ok(out) = sanitize_component(&s) {
                prop_assert!(out.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'));
                prop_assert!(!out.starts_with('-') && !out.ends_with('-'));
            }
        }
    }
}
