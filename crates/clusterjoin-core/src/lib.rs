#![forbid(unsafe_code)]
//! clusterjoin-core: shared kernel for the out-of-core join engine.
//!
//! This crate contains only *pure* types, small helpers, and interfaces
//! (traits) that other crates implement. There is **no I/O** and **no
//! allocation policy** here.
//!
//! Crates that use this:
//! - clusterjoin-mem: implements the MemoryBudget trait (guards live there).
//! - clusterjoin-io: reads CSV chunks into `RowBatch` and writes them back out.
//! - clusterjoin-operators: the in-memory equal-join over one chunk pair.
//! - clusterjoin-planner: profiles samples and produces a `ClusterPlan`.
//! - clusterjoin-exec: drives the block-nested loop and emits a `RunManifest`.

pub mod budget;
pub mod cluster;
pub mod config;
pub mod error;
pub mod hash;
pub mod join;
pub mod manifest;
pub mod schema;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
