//! Operator footprint model.

use serde::{Deserialize, Serialize};

/// Coarse memory model for one block flowing through an operator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Footprint {
    /// Estimated bytes per input row held by the operator itself.
    pub bytes_per_row: u64,
    /// Fixed per-block overhead (hash table header, scratch vectors).
    pub overhead_bytes: u64,
}

impl Footprint {
    /// Estimate total live bytes for a block of `rows`.
    pub fn estimate_live(&self, rows: u64) -> u64 {
        self.overhead_bytes + self.bytes_per_row.saturating_mul(rows)
    }
}
