//! Strategy registry and capability-aware resolver (spec.md §4.F/G).

pub mod registry;
pub mod resolve;

pub use registry::{DuplicateStrategyId, Registry};
pub use resolve::{resolve, Resolved, ResolveOptions};
