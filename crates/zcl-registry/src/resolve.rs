//! `Resolve`: walk a strategy chain, accumulating failures, and return
//! the first runtime that passes both the capability and probe checks
//! (spec.md §4.F/G).

use zcl_runtime::{CapabilitySet, Runtime, RuntimeError, RuntimeErrorKind, StrategyFailure};

use crate::registry::Registry;

/// Inputs to [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Strategy ids in preference order, as supplied by the caller.
    pub chain: Vec<String>,
    /// Capabilities every candidate runtime must have.
    pub required_caps: CapabilitySet,
}

/// A runtime chosen by [`resolve`], together with the normalized chain
/// that produced it.
pub struct Resolved<'a> {
    pub runtime: &'a dyn Runtime,
    pub chain: Vec<String>,
}

/// Normalize a chain: lowercase, trim, dedupe while preserving first
/// occurrence order.
fn normalize_chain(chain: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for raw in chain {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
    }
    out
}

/// Resolve the first strategy in `opts.chain` that is registered, has
/// every required capability, and passes `probe`. Accumulates every
/// attempted strategy's failure reason; never short-circuits except on
/// a missing strategy id, which fails the whole resolution immediately
/// since no later chain entry can make a typo valid.
pub fn resolve<'a>(
    registry: &'a Registry,
    opts: ResolveOptions,
) -> Result<Resolved<'a>, RuntimeError> {
    let chain = normalize_chain(&opts.chain);
    if chain.is_empty() {
        return Err(RuntimeError::new(
            RuntimeErrorKind::UnsupportedStrategy,
            "strategy chain is empty after normalization",
        ));
    }

    let mut failures = Vec::new();

    for id in &chain {
        let Some(runtime) = registry.get(id) else {
            return Err(RuntimeError::new(
                RuntimeErrorKind::UnsupportedStrategy,
                format!("strategy '{id}' is not registered"),
            )
            .with_strategy(id.clone()));
        };

        let missing = runtime.capabilities().missing(&opts.required_caps);
        if !missing.is_empty() {
            let names = missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            failures.push(StrategyFailure {
                strategy: id.clone(),
                kind: RuntimeErrorKind::CapabilityUnsupported,
                message: format!("missing capabilities: {names}"),
            });
            continue;
        }

        match runtime.probe() {
            Ok(()) => {
                return Ok(Resolved {
                    runtime,
                    chain: chain.clone(),
                });
            }
            Err(err) => {
                failures.push(StrategyFailure {
                    strategy: id.clone(),
                    kind: err.kind,
                    message: err.message,
                });
            }
        }
    }

    Err(
        RuntimeError::new(RuntimeErrorKind::StrategyUnavailable, "no strategy in chain passed capability/probe checks")
            .with_failures(failures),
    )
}
