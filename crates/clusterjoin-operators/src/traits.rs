//! Operator trait + common interfaces.
//!
//! The executor asks an operator for its working-memory footprint before it
//! evaluates a chunk pair, so the hash table is accounted against the budget.

use crate::plan::Footprint;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("execution error: {0}")]
    Exec(String),

    #[error("join key '{key}' not found in {side} input")]
    MissingKey { key: String, side: &'static str },
}

/// Trait that all operators must implement.
pub trait Operator: Send + Sync + 'static {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    /// Working memory for a block with `rows` build-side rows.
    fn memory_need(&self, rows: u64, bytes: u64) -> Footprint;
}
