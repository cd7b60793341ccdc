//! `zcl`: harness for orchestrating AI-agent attempts and capturing
//! verifiable evidence of what happened.
//!
//! This crate is a thin re-export of the workspace's core crates plus
//! the CLI entry point; the actual component implementations live in
//! `crates/zcl-*`.

pub use zcl_cli as cli;

pub use zcl_conformance as conformance;
pub use zcl_envpolicy as envpolicy;
pub use zcl_lifecycle as lifecycle;
pub use zcl_lock as lock;
pub use zcl_ops as ops;
pub use zcl_plan as plan;
pub use zcl_registry as registry;
pub use zcl_report as report;
pub use zcl_rpc_adapter as rpc_adapter;
pub use zcl_runtime as runtime;
pub use zcl_schema as schema;
pub use zcl_store as store;
pub use zcl_utils as utils;
pub use zcl_validate as validate;
