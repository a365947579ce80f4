//! Cluster-size estimation.
//!
//! One cluster of each side plus their merge must fit in 80% of the budget:
//!
//! ```text
//! max_join_memory_per_row = mpr_left + mpr_right
//! memory_limit            = 0.8 * memory_available
//! max_cluster_size        = memory_limit / (2 * max_join_memory_per_row)
//! cluster_size            = round(max_cluster_size / 1000) * 1000
//! nclusters_i             = floor(nrows_i / cluster_size) + 1
//! ```
//!
//! Rounding never goes above `max_cluster_size`: when it would, the lower
//! thousand is used. Below one thousand rows the size is `floor(max)`, at least 1.

use serde::{Deserialize, Serialize};

use clusterjoin_core::cluster::ClusterPlan;

use crate::error::{PlanError, Result};

/// Share of the budget the clusters may occupy.
pub const MEMORY_LIMIT_FRACTION: f64 = 0.8;

/// Cluster sizes are multiples of this many rows when the budget allows.
pub const CLUSTER_GRANULARITY: f64 = 1000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EstimateInput {
    pub memory_per_row_left: f64,
    pub memory_per_row_right: f64,
    pub memory_available: usize,
    pub nrows_left: u64,
    pub nrows_right: u64,
    /// Skip estimation and use this size.
    pub cluster_size_override: Option<u64>,
}

/// The plan plus the intermediate figures, for logging and `explain`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Estimate {
    pub plan: ClusterPlan,
    pub max_join_memory_per_row: f64,
    pub memory_limit: f64,
    pub max_cluster_size: f64,
    /// The budget was too small for a thousand-row cluster.
    pub degenerate: bool,
    pub overridden: bool,
}

pub fn estimate_cluster_plan(input: &EstimateInput) -> Result<Estimate> {
    let mpr_l = input.memory_per_row_left;
    let mpr_r = input.memory_per_row_right;
    if !(mpr_l.is_finite() && mpr_l > 0.0 && mpr_r.is_finite() && mpr_r > 0.0) {
        return Err(PlanError::Config(format!(
            "per-row memory must be positive and finite (left {mpr_l}, right {mpr_r})"
        )));
    }
    if input.memory_available == 0 {
        return Err(PlanError::Config("memory_available must be positive".into()));
    }

    let max_join_memory_per_row = mpr_l + mpr_r;
    let memory_limit = MEMORY_LIMIT_FRACTION * input.memory_available as f64;
    let max_cluster_size = memory_limit / (2.0 * max_join_memory_per_row);

    let mut degenerate = false;
    let cluster_size = match input.cluster_size_override {
        Some(0) => {
            return Err(PlanError::Config("cluster size override must be at least 1".into()))
        }
        Some(forced) => forced,
        None => {
            let mut rounded = (max_cluster_size / CLUSTER_GRANULARITY).round() * CLUSTER_GRANULARITY;
            if rounded > max_cluster_size {
                rounded -= CLUSTER_GRANULARITY;
            }
            if rounded >= CLUSTER_GRANULARITY {
                rounded as u64
            } else {
                degenerate = true;
                let fallback = (max_cluster_size.floor() as u64).max(1);
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    max_cluster_size,
                    fallback,
                    "budget too small for a thousand-row cluster"
                );
                fallback
            }
        }
    };

    let plan = ClusterPlan::new(cluster_size, input.nrows_left, input.nrows_right);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        cluster_size = plan.cluster_size,
        nclusters_left = plan.nclusters_left,
        nclusters_right = plan.nclusters_right,
        max_join_memory_per_row,
        memory_limit,
        "cluster plan"
    );

    Ok(Estimate {
        plan,
        max_join_memory_per_row,
        memory_limit,
        max_cluster_size,
        degenerate,
        overridden: input.cluster_size_override.is_some(),
    })
}
