#![forbid(unsafe_code)]
//! clusterjoin-exec: validation, planning, and the block-nested-loop runtime.
//!
//! `Engine::prepare` profiles both inputs, checks the key, counts rows and
//! estimates the cluster plan. `Engine::run` then streams the join to a
//! writer, one chunk pair at a time, and returns a `RunManifest`.

pub mod executor;
pub mod matches;
pub mod metrics;
pub mod runtime;

pub use runtime::{DatasetProfile, Engine, ExecError, PreparedJoin};
