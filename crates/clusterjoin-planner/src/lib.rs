#![forbid(unsafe_code)]
//! clusterjoin-planner: decide how to cut both inputs into clusters.
//!
//! - `profile`: bounded head sample of a file → per-row footprint and header.
//! - `estimate`: per-row footprints + row counts + memory budget → `ClusterPlan`.
//!
//! Both run once per join, before any chunk is materialized.

pub mod error;
pub mod estimate;
pub mod profile;

pub use error::{PlanError, Result};
pub use estimate::{estimate_cluster_plan, EstimateInput, Estimate};
pub use profile::SampleProfile;
