//! The strategy registry: `StrategyID` (lowercase) → `Runtime` (spec.md
//! §4.F/G).

use std::collections::BTreeMap;

use zcl_runtime::Runtime;

/// Error raised when registering a strategy id that already exists.
#[derive(Debug, thiserror::Error)]
#[error("strategy id '{0}' is already registered")]
pub struct DuplicateStrategyId(pub String);

/// Maps strategy ids to their `Runtime`. Registration rejects duplicates
/// outright; nothing in this crate silently overwrites an existing
/// entry.
#[derive(Default)]
pub struct Registry {
    runtimes: BTreeMap<String, Box<dyn Runtime>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, runtime: Box<dyn Runtime>) -> Result<(), DuplicateStrategyId> {
        let id = runtime.id().to_string();
        if self.runtimes.contains_key(&id) {
            return Err(DuplicateStrategyId(id));
        }
        self.runtimes.insert(id, runtime);
        Ok(())
    }

    /// Registered strategy ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.runtimes.keys().cloned().collect()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&dyn Runtime> {
        self.runtimes.get(id).map(AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zcl_runtime::{CapabilitySet, RuntimeError, Session, SessionOptions};

    struct StubRuntime {
        id: &'static str,
    }

    impl Runtime for StubRuntime {
        fn id(&self) -> &str {
            self.id
        }
        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::empty()
        }
        fn probe(&self) -> Result<(), RuntimeError> {
            Ok(())
        }
        fn start_session(&self, _opts: SessionOptions) -> Result<Box<dyn Session>, RuntimeError> {
            unimplemented!()
        }
    }

    #[test]
    fn ids_are_sorted() {
        let mut registry = Registry::new();
        registry.register(Box::new(StubRuntime { id: "zeta" })).unwrap();
        registry.register(Box::new(StubRuntime { id: "alpha" })).unwrap();
        assert_eq!(registry.ids(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn registering_a_duplicate_id_errors() {
        let mut registry = Registry::new();
        registry.register(Box::new(StubRuntime { id: "codex" })).unwrap();
        let err = registry.register(Box::new(StubRuntime { id: "codex" })).unwrap_err();
        assert_eq!(err.0, "codex");
    }
}
