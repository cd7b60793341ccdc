//! The pluggable-adapter abstraction: `Runtime`/`Session` traits,
//! capability negotiation, the event envelope, the closed error
//! taxonomy, and per-strategy health counters (components F/G, §7).

pub mod capability;
pub mod contract;
pub mod error;
pub mod event;
pub mod health;
pub mod traits;

pub use capability::{Capability, CapabilitySet};
pub use contract::{ProtocolContract, UserAgent, Version};
pub use error::{RuntimeError, RuntimeErrorKind, StrategyFailure};
pub use event::Event;
pub use health::{Counter, HealthCounters};
pub use traits::{ListenerId, Runtime, Session, SessionOptions};
