//! Cluster ranges and the per-run cluster plan.
//!
//! Row indices are 1-based over data rows; index 0 is the header and is never
//! excluded from a chunk.

use serde::{Deserialize, Serialize};

/// Inclusive range predicate `[low, high]` over 1-based row indices.
///
/// `keep` is a pure function of its inputs, so one value can be handed to any
/// number of readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub low: u64,
    pub high: u64,
}

impl RowRange {
    pub fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    /// Range covering every data row.
    pub fn all() -> Self {
        Self {
            low: 1,
            high: u64::MAX,
        }
    }

    /// Whether row `row_index` belongs to the chunk. The header always does.
    pub fn keep(&self, row_index: u64) -> bool {
        row_index == 0 || (row_index >= self.low && row_index <= self.high)
    }

    /// True once `row_index` is past the end of the range.
    pub fn is_past(&self, row_index: u64) -> bool {
        row_index > self.high
    }
}

/// One contiguous slice of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// 0-based cluster index within its dataset.
    pub index: u64,
    pub range: RowRange,
}

impl Cluster {
    /// Cluster `index` for the given size: `[index*size + 1, (index+1)*size]`.
    pub fn nth(index: u64, cluster_size: u64) -> Self {
        let low = index.saturating_mul(cluster_size).saturating_add(1);
        let high = index.saturating_add(1).saturating_mul(cluster_size);
        Self {
            index,
            range: RowRange::new(low, high),
        }
    }
}

/// Cluster size shared by both datasets and the resulting cluster counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterPlan {
    pub cluster_size: u64,
    pub nclusters_left: u64,
    pub nclusters_right: u64,
    pub nrows_left: u64,
    pub nrows_right: u64,
}

impl ClusterPlan {
    /// Derive cluster counts. `cluster_size` must be at least 1.
    pub fn new(cluster_size: u64, nrows_left: u64, nrows_right: u64) -> Self {
        debug_assert!(cluster_size >= 1);
        let cluster_size = cluster_size.max(1);
        Self {
            cluster_size,
            nclusters_left: nclusters(nrows_left, cluster_size),
            nclusters_right: nclusters(nrows_right, cluster_size),
            nrows_left,
            nrows_right,
        }
    }

    /// The right dataset fits one cluster and is cached for the whole run.
    pub fn is_degenerate(&self) -> bool {
        self.nclusters_right == 1
    }

    pub fn left_clusters(&self) -> impl Iterator<Item = Cluster> + '_ {
        (0..self.nclusters_left).map(move |i| Cluster::nth(i, self.cluster_size))
    }

    pub fn right_clusters(&self) -> impl Iterator<Item = Cluster> + '_ {
        (0..self.nclusters_right).map(move |i| Cluster::nth(i, self.cluster_size))
    }

    /// Number of chunk-pair join invocations the plan performs.
    pub fn pair_count(&self) -> u64 {
        self.nclusters_left.saturating_mul(self.nclusters_right)
    }
}

/// `floor(nrows / cluster_size) + 1`; always at least one cluster.
pub fn nclusters(nrows: u64, cluster_size: u64) -> u64 {
    nrows / cluster_size.max(1) + 1
}
