//! Protocol compatibility contract checked during the startup compat
//! probe (spec.md §4.H step 5).

/// Minimum protocol version (major.minor) and, optionally, minimum
/// runtime semver an adapter will accept from a `userAgent` string.
#[derive(Debug, Clone)]
pub struct ProtocolContract {
    pub minimum_protocol_major: u32,
    pub minimum_protocol_minor: u32,
    pub minimum_runtime_version: Option<String>,
}

/// `<name>/<semver>` parsed out of a `userAgent` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    pub name: String,
    pub version: Version,
}

/// A loosely-parsed, component-wise comparable version. Missing trailing
/// components compare as zero, matching the spec's "compared loosely
/// component-wise" wording.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(pub Vec<u64>);

impl Version {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Option<Vec<u64>> = s
            .split('.')
            .map(|p| p.chars().take_while(|c| c.is_ascii_digit()).collect::<String>())
            .map(|digits| if digits.is_empty() { None } else { digits.parse().ok() })
            .collect();
        parts.map(Version)
    }

    fn component(&self, idx: usize) -> u64 {
        self.0.get(idx).copied().unwrap_or(0)
    }
}

impl UserAgent {
    #[must_use]
    pub fn parse(user_agent: &str) -> Option<Self> {
        let (name, version) = user_agent.split_once('/')?;
        Some(Self {
            name: name.to_string(),
            version: Version::parse(version)?,
        })
    }
}

impl ProtocolContract {
    /// Whether `user_agent` satisfies this contract: protocol
    /// major.minor >= minimum, and runtime version (if a minimum is
    /// configured) >= that minimum.
    #[must_use]
    pub fn is_satisfied_by(&self, user_agent: &UserAgent) -> bool {
        let protocol_ok = user_agent.version.component(0) > self.minimum_protocol_major
            || (user_agent.version.component(0) == self.minimum_protocol_major
                && user_agent.version.component(1) >= self.minimum_protocol_minor);

        let runtime_ok = match &self.minimum_runtime_version {
            None => true,
            Some(min) => Version::parse(min)
                .map(|min_version| user_agent.version >= min_version)
                .unwrap_or(true),
        };

        protocol_ok && runtime_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_version() {
        let ua = UserAgent::parse("codex-cli/1.4.2").unwrap();
        assert_eq!(ua.name, "codex-cli");
        assert_eq!(ua.version, Version(vec![1, 4, 2]));
    }

    #[test]
    fn contract_accepts_equal_minimum() {
        let contract = ProtocolContract {
            minimum_protocol_major: 1,
            minimum_protocol_minor: 4,
            minimum_runtime_version: None,
        };
        let ua = UserAgent::parse("codex-cli/1.4.0").unwrap();
        assert!(contract.is_satisfied_by(&ua));
    }

    #[test]
    fn contract_rejects_below_minimum_minor() {
        let contract = ProtocolContract {
            minimum_protocol_major: 1,
            minimum_protocol_minor: 4,
            minimum_runtime_version: None,
        };
        let ua = UserAgent::parse("codex-cli/1.3.9").unwrap();
        assert!(!contract.is_satisfied_by(&ua));
    }

    #[test]
    fn contract_rejects_below_minimum_runtime_version() {
        let contract = ProtocolContract {
            minimum_protocol_major: 1,
            minimum_protocol_minor: 0,
            minimum_runtime_version: Some("2.0.0".to_string()),
        };
        let ua = UserAgent::parse("codex-cli/1.9.9").unwrap();
        assert!(!contract.is_satisfied_by(&ua));
    }
}
