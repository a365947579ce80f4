//! In-memory hash equal-join over one chunk pair.
//!
//! The build side is hashed on the normalized key (`KeyValue`); the probe side
//! is scanned in order, which fixes the output order:
//! - inner / left: left order, matches in right order
//! - right: right order, matches in left order
//!
//! The join treats its two inputs as complete relations. Besides the merged
//! batch it reports which rows of each side found a partner, so the executor
//! can finish outer joins whose other side spans several chunks.

use std::collections::HashMap;

use clusterjoin_core::join::{JoinType, KeyValue};
use clusterjoin_core::schema::Schema;
use clusterjoin_core::types::RowBatch;

use super::layout::JoinLayout;
use crate::plan::Footprint;
use crate::traits::{OpError, Operator};

/// Output row as (left row, right row); `None` marks the null-filled side.
pub type PairIndex = (Option<usize>, Option<usize>);

/// Result of joining one chunk pair.
#[derive(Debug, Clone)]
pub struct JoinOutput {
    pub batch: RowBatch,
    /// `left_matched[i]`: left row `i` had at least one partner.
    pub left_matched: Vec<bool>,
    /// `right_matched[j]`: right row `j` had at least one partner.
    pub right_matched: Vec<bool>,
}

// Rough cost of one build-side entry: key, bucket slot, and row index.
const BYTES_PER_BUILD_ROW: u64 = 64;
const TABLE_OVERHEAD_BYTES: u64 = 4 * 1024;

pub struct HashJoin {
    pub key: String,
    pub join_type: JoinType,
    layout: JoinLayout,
}

impl HashJoin {
    /// Resolve the output layout for inputs with the given headers.
    pub fn new(
        key: impl Into<String>,
        join_type: JoinType,
        left: &Schema,
        right: &Schema,
    ) -> Result<Self, OpError> {
        let key = key.into();
        let layout = JoinLayout::new(left, right, &key)?;
        Ok(Self {
            key,
            join_type,
            layout,
        })
    }

    pub fn output_schema(&self) -> Schema {
        self.layout.schema()
    }

    pub fn layout(&self) -> &JoinLayout {
        &self.layout
    }

    /// Join `left` with `right` as if they were the whole relations.
    pub fn join(
        &self,
        left: &RowBatch,
        right: &RowBatch,
        join_type: JoinType,
    ) -> Result<JoinOutput, OpError> {
        self.layout.check_inputs(left, right)?;
        let nl = left.num_rows();
        let nr = right.num_rows();
        let mut left_matched = vec![false; nl];
        let mut right_matched = vec![false; nr];
        let mut pairs: Vec<PairIndex> = Vec::new();

        match join_type {
            JoinType::Inner | JoinType::Left => {
                let table = build(right, self.layout.right_key());
                let keys = &left.columns[self.layout.left_key()].values;
                for (i, v) in keys.iter().enumerate() {
                    let hits = KeyValue::from_scalar(v).and_then(|k| table.get(&k));
                    match hits {
                        Some(rows) => {
                            left_matched[i] = true;
                            for &j in rows {
                                right_matched[j] = true;
                                pairs.push((Some(i), Some(j)));
                            }
                        }
                        None if join_type == JoinType::Left => pairs.push((Some(i), None)),
                        None => {}
                    }
                }
            }
            JoinType::Right => {
                let table = build(left, self.layout.left_key());
                let keys = &right.columns[self.layout.right_key()].values;
                for (j, v) in keys.iter().enumerate() {
                    match KeyValue::from_scalar(v).and_then(|k| table.get(&k)) {
                        Some(rows) => {
                            right_matched[j] = true;
                            for &i in rows {
                                left_matched[i] = true;
                                pairs.push((Some(i), Some(j)));
                            }
                        }
                        None => pairs.push((None, Some(j))),
                    }
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(left = nl, right = nr, out = pairs.len(), %join_type, "hash join");

        let batch = self.layout.materialize(Some(left), Some(right), &pairs)?;
        Ok(JoinOutput {
            batch,
            left_matched,
            right_matched,
        })
    }

    /// Left rows `rows` with every right-only column null.
    pub fn null_extend_left(&self, left: &RowBatch, rows: &[usize]) -> Result<RowBatch, OpError> {
        let pairs: Vec<PairIndex> = rows.iter().map(|&i| (Some(i), None)).collect();
        self.layout.materialize(Some(left), None, &pairs)
    }

    /// Right rows `rows` with every left-only column null.
    pub fn null_extend_right(&self, right: &RowBatch, rows: &[usize]) -> Result<RowBatch, OpError> {
        let pairs: Vec<PairIndex> = rows.iter().map(|&j| (None, Some(j))).collect();
        self.layout.materialize(None, Some(right), &pairs)
    }
}

fn build(batch: &RowBatch, key_col: usize) -> HashMap<KeyValue, Vec<usize>> {
    let mut table: HashMap<KeyValue, Vec<usize>> = HashMap::with_capacity(batch.num_rows());
    for (idx, v) in batch.columns[key_col].values.iter().enumerate() {
        if let Some(k) = KeyValue::from_scalar(v) {
            table.entry(k).or_default().push(idx);
        }
    }
    table
}

impl Operator for HashJoin {
    fn name(&self) -> &'static str {
        "join_hash"
    }

    fn memory_need(&self, _rows: u64, _bytes: u64) -> Footprint {
        Footprint {
            bytes_per_row: BYTES_PER_BUILD_ROW,
            overhead_bytes: TABLE_OVERHEAD_BYTES,
        }
    }
}
