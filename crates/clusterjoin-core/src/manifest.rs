//! Run manifest for audit.
//!
//! The engine emits a manifest after a successful join. It records the plan
//! digest, how much work the block-nested loop did, and the accounted peak.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cluster::ClusterPlan;
use crate::hash::Hash256;
use crate::join::JoinSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

/// Counters accumulated while the executor runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Calls into the in-memory equal-join primitive.
    pub join_invocations: u64,
    /// Batches handed to the output writer (including null-filled remainders).
    pub batches_written: u64,
    /// Data rows written (header excluded).
    pub rows_written: u64,
    /// Chunk tables materialized from disk.
    pub chunks_read: u64,
    /// Highest accounted budget usage observed.
    pub peak_accounted_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the join spec and cluster plan.
    pub plan_hash: Hash256,

    pub spec: JoinSpec,
    pub plan: ClusterPlan,

    /// Engine version string for provenance.
    pub engine_version: String,

    pub stats: RunStats,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(plan_hash: Hash256, spec: JoinSpec, plan: ClusterPlan, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            plan_hash,
            spec,
            plan,
            engine_version: crate::VERSION.to_string(),
            stats: RunStats::default(),
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, stats: RunStats) -> Self {
        self.finished_ms = finished_ms;
        self.stats = stats;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}
