//! Allow/block/redact rules for the environment handed to a spawned
//! runtime adapter's child process (component E).
//!
//! An [`EnvPolicy`] never trusts the ambient process environment by
//! default: everything not explicitly allowed is blocked, and values of
//! keys that look secret-shaped are never written to a log verbatim.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Four sets plus a redaction-hint list, matching the input an adapter
/// needs to decide what a child process may see and what a logger may
/// print.
#[derive(Debug, Clone)]
pub struct EnvPolicy {
    allow_exact: Vec<String>,
    allow_prefix: Vec<String>,
    block_exact: Vec<String>,
    block_prefix: Vec<String>,
    redact_hints: Vec<String>,
}

/// Error raised when an explicitly provided variable (attempt env or
/// adapter extras) is blocked by policy, or when filtering would leave
/// no allowed variables at all.
#[derive(Debug, thiserror::Error)]
pub enum EnvPolicyError {
    #[error("env_policy: variable {key} is blocked by policy")]
    Blocked { key: String },

    #[error("env_policy: filtering yielded an empty allowed environment")]
    EmptyAllowedEnvironment,
}

impl EnvPolicy {
    pub fn new(
        allow_exact: Vec<String>,
        allow_prefix: Vec<String>,
        block_exact: Vec<String>,
        block_prefix: Vec<String>,
        redact_hints: Vec<String>,
    ) -> Self {
        Self {
            allow_exact: allow_exact.into_iter().map(|s| s.to_uppercase()).collect(),
            allow_prefix: allow_prefix.into_iter().map(|s| s.to_uppercase()).collect(),
            block_exact: block_exact.into_iter().map(|s| s.to_uppercase()).collect(),
            block_prefix: block_prefix.into_iter().map(|s| s.to_uppercase()).collect(),
            redact_hints: redact_hints.into_iter().map(|s| s.to_uppercase()).collect(),
        }
    }

    /// Return a copy of `self` with an additional explicit allow-exact
    /// entry, used when an attempt or adapter needs a variable the
    /// default policy does not carry.
    pub fn with_allowed(&self, key: impl Into<String>) -> Self {
        let mut clone = self.clone();
        clone.allow_exact.push(key.into().to_uppercase());
        clone
    }

    fn is_blocked(&self, key_upper: &str) -> bool {
        self.block_exact.iter().any(|k| k == key_upper)
            || self.block_prefix.iter().any(|p| key_upper.starts_with(p.as_str()))
    }

    fn is_allowed(&self, key_upper: &str) -> bool {
        self.allow_exact.iter().any(|k| k == key_upper)
            || self.allow_prefix.iter().any(|p| key_upper.starts_with(p.as_str()))
    }

    /// Normalize keys to upper-case, drop blocked keys, drop keys that
    /// are not explicitly allowed, and return the surviving map in a
    /// deterministic (sorted) order.
    pub fn filter(&self, env: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for (key, value) in env {
            let key_upper = key.to_uppercase();
            if self.is_blocked(&key_upper) {
                continue;
            }
            if self.is_allowed(&key_upper) {
                out.insert(key_upper, value.clone());
            }
        }
        out
    }

    /// Validate an explicitly-provided variable (attempt env, adapter
    /// extras) against policy, returning an error naming the offender
    /// if it is blocked. Does not require the key to be in an allow set:
    /// explicit provision is itself a form of allow-listing, subject
    /// only to the block rules.
    pub fn check_explicit(&self, key: &str) -> Result<(), EnvPolicyError> {
        let key_upper = key.to_uppercase();
        if self.is_blocked(&key_upper) {
            return Err(EnvPolicyError::Blocked {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Filter `env`, failing if the result is empty. Adapters call this
    /// at startup rather than [`filter`](Self::filter) directly, since an
    /// empty allowed environment means the child cannot run at all.
    pub fn filter_or_refuse(
        &self,
        env: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, EnvPolicyError> {
        let filtered = self.filter(env);
        if filtered.is_empty() {
            return Err(EnvPolicyError::EmptyAllowedEnvironment);
        }
        Ok(filtered)
    }

    /// Replace the value of any key whose name contains a redact-hint
    /// substring (case-insensitively) with `[REDACTED]`. Used before
    /// writing an environment map to a log or trace artifact.
    pub fn redact_for_log(&self, env: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        env.iter()
            .map(|(key, value)| {
                let key_upper = key.to_uppercase();
                let redacted = self
                    .redact_hints
                    .iter()
                    .any(|hint| key_upper.contains(hint.as_str()));
                let out_value = if redacted {
                    "[REDACTED]".to_string()
                } else {
                    value.clone()
                };
                (key.clone(), out_value)
            })
            .collect()
    }
}

/// POSIX basics allowed regardless of project-specific prefixes.
const DEFAULT_ALLOW_EXACT: &[&str] = &["PATH", "HOME", "LANG", "LC_ALL", "TZ", "TMPDIR", "TERM"];

const DEFAULT_ALLOW_PREFIX: &[&str] = &["ZCL_", "CODEX_"];

/// Named cloud/provider secret variables blocked outright, in addition
/// to the broader secret-shaped prefixes.
const DEFAULT_BLOCK_EXACT: &[&str] = &[
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AZURE_CLIENT_SECRET",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "GITHUB_TOKEN",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
];

const DEFAULT_BLOCK_PREFIX: &[&str] = &["SECRET_", "TOKEN_", "PASSWORD_", "CREDENTIAL_"];

const DEFAULT_REDACT_HINTS: &[&str] =
    &["SECRET", "TOKEN", "KEY", "PASSWORD", "CREDENTIAL", "AUTH"];

static DEFAULT_POLICY: Lazy<EnvPolicy> = Lazy::new(|| {
    EnvPolicy::new(
        DEFAULT_ALLOW_EXACT.iter().map(|s| s.to_string()).collect(),
        DEFAULT_ALLOW_PREFIX.iter().map(|s| s.to_string()).collect(),
        DEFAULT_BLOCK_EXACT.iter().map(|s| s.to_string()).collect(),
        DEFAULT_BLOCK_PREFIX.iter().map(|s| s.to_string()).collect(),
        DEFAULT_REDACT_HINTS.iter().map(|s| s.to_string()).collect(),
    )
});

/// The default policy: POSIX basics plus `ZCL_`/`CODEX_` prefixes
/// allowed; named cloud secrets plus `SECRET_`/`TOKEN_`/`PASSWORD_`/
/// `CREDENTIAL_` prefixes blocked.
pub fn default_policy() -> &'static EnvPolicy {
    &DEFAULT_POLICY
}
