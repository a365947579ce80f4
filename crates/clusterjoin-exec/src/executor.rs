//! Block-nested-loop executor.
//!
//! For every left cluster the left chunk is read once; it is then joined with
//! each right cluster in turn. When the right side fits in a single cluster the
//! right table is read once and cached for the whole run.
//!
//! Outer joins whose other side spans several clusters cannot null-fill per
//! pair: a row unmatched in one chunk pair may match in the next. Those pairs
//! run as inner joins and `MatchSet`s record which preserved rows found a
//! partner; the rest are null-filled once all partners have been probed.

use std::io::Write;

use clusterjoin_core::cluster::{ClusterPlan, RowRange};
use clusterjoin_core::join::JoinType;
use clusterjoin_core::manifest::RunStats;
use clusterjoin_core::types::RowBatch;
use clusterjoin_io::{ChunkReader, CsvWriter};
use clusterjoin_mem::guard::BudgetGuardImpl;
use clusterjoin_mem::MemoryBudgetImpl;
use clusterjoin_operators::traits::Operator;
use clusterjoin_operators::HashJoin;

use crate::matches::MatchSet;
use crate::metrics::emit_span;
use crate::runtime::ExecError;

/// A materialized chunk and the budget it holds until dropped.
struct Chunk {
    batch: RowBatch,
    /// 0-based index of the chunk's first row within its dataset.
    offset: usize,
    _guard: Option<BudgetGuardImpl>,
}

impl Chunk {
    fn rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// How each chunk pair is joined, and which side needs tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PairStrategy {
    pair_kind: JoinType,
    track_left: bool,
    track_right: bool,
}

impl PairStrategy {
    fn for_plan(join_type: JoinType, plan: &ClusterPlan) -> Self {
        let single_right = plan.nclusters_right == 1;
        let single_left = plan.nclusters_left == 1;
        match join_type {
            JoinType::Inner => Self {
                pair_kind: JoinType::Inner,
                track_left: false,
                track_right: false,
            },
            JoinType::Left if single_right => Self {
                pair_kind: JoinType::Left,
                track_left: false,
                track_right: false,
            },
            JoinType::Left => Self {
                pair_kind: JoinType::Inner,
                track_left: true,
                track_right: false,
            },
            JoinType::Right if single_left => Self {
                pair_kind: JoinType::Right,
                track_left: false,
                track_right: false,
            },
            JoinType::Right => Self {
                pair_kind: JoinType::Inner,
                track_left: false,
                track_right: true,
            },
        }
    }
}

pub struct BlockNestedLoop<'a, W: Write> {
    op: &'a HashJoin,
    left: &'a ChunkReader,
    right: &'a ChunkReader,
    plan: ClusterPlan,
    strategy: PairStrategy,
    budget: MemoryBudgetImpl,
    enforce_budget: bool,
    out: &'a mut CsvWriter<W>,
    header_pending: bool,
    stats: RunStats,
}

impl<'a, W: Write> BlockNestedLoop<'a, W> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        op: &'a HashJoin,
        left: &'a ChunkReader,
        right: &'a ChunkReader,
        plan: ClusterPlan,
        budget: MemoryBudgetImpl,
        enforce_budget: bool,
        out: &'a mut CsvWriter<W>,
    ) -> Self {
        let strategy = PairStrategy::for_plan(op.join_type, &plan);
        Self {
            op,
            left,
            right,
            plan,
            strategy,
            budget,
            enforce_budget,
            out,
            header_pending: true,
            stats: RunStats::default(),
        }
    }

    /// Drive the loop to completion and return the counters.
    pub fn run(mut self) -> Result<RunStats, ExecError> {
        let plan = self.plan;

        let cached_right = if plan.is_degenerate() {
            Some(self.load(self.right, RowRange::all(), "right_table")?)
        } else {
            None
        };

        let mut right_seen = self
            .strategy
            .track_right
            .then(|| MatchSet::new(plan.nrows_right as usize));
        let _seen_guard = match &right_seen {
            Some(s) => self.account(s.heap_bytes(), "right_matches")?,
            None => None,
        };

        for lc in plan.left_clusters() {
            let left = self.load(self.left, lc.range, "left_chunk")?;
            let mut left_seen = self.strategy.track_left.then(|| MatchSet::new(left.rows()));

            match &cached_right {
                Some(right) => {
                    self.join_pair(lc.index, 0, &left, right, &mut left_seen, &mut right_seen)?;
                }
                None => {
                    for rc in plan.right_clusters() {
                        let right = self.load(self.right, rc.range, "right_chunk")?;
                        self.join_pair(
                            lc.index,
                            rc.index,
                            &left,
                            &right,
                            &mut left_seen,
                            &mut right_seen,
                        )?;
                    }
                }
            }

            if let Some(seen) = left_seen {
                let rows = seen.unmatched(0, left.rows());
                if !rows.is_empty() {
                    let batch = self.op.null_extend_left(&left.batch, &rows)?;
                    self.write(&batch)?;
                }
            }
        }

        if let Some(seen) = right_seen {
            match &cached_right {
                Some(right) => self.emit_unmatched_right(&seen, right)?,
                None => {
                    for rc in plan.right_clusters() {
                        let right = self.load(self.right, rc.range, "right_chunk")?;
                        self.emit_unmatched_right(&seen, &right)?;
                    }
                }
            }
        }

        if self.header_pending {
            let empty = RowBatch::empty(&self.op.output_schema());
            self.write(&empty)?;
        }

        self.stats.peak_accounted_bytes = self.budget.peak_bytes() as u64;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            pairs = self.stats.join_invocations,
            rows = self.stats.rows_written,
            peak = self.stats.peak_accounted_bytes,
            "block-nested loop finished"
        );

        Ok(self.stats)
    }

    fn join_pair(
        &mut self,
        lci: u64,
        rci: u64,
        left: &Chunk,
        right: &Chunk,
        left_seen: &mut Option<MatchSet>,
        right_seen: &mut Option<MatchSet>,
    ) -> Result<(), ExecError> {
        let build_rows = match self.strategy.pair_kind {
            JoinType::Right => left.rows(),
            JoinType::Inner | JoinType::Left => right.rows(),
        };
        let table_bytes = self
            .op
            .memory_need(build_rows as u64, 0)
            .estimate_live(build_rows as u64);
        let _table = self.account(table_bytes as usize, "hash_table")?;

        let out = self
            .op
            .join(&left.batch, &right.batch, self.strategy.pair_kind)?;
        self.stats.join_invocations += 1;

        // left marks are local to the current chunk, right marks span the file
        if let Some(seen) = left_seen {
            seen.mark_flags(0, &out.left_matched);
        }
        if let Some(seen) = right_seen {
            seen.mark_flags(right.offset, &out.right_matched);
        }

        emit_span(
            "join_pair",
            &[
                ("op", self.op.name().to_string()),
                ("lci", lci.to_string()),
                ("rci", rci.to_string()),
                ("rows", out.batch.num_rows().to_string()),
            ],
        );

        self.write(&out.batch)
    }

    fn emit_unmatched_right(&mut self, seen: &MatchSet, right: &Chunk) -> Result<(), ExecError> {
        let rows = seen.unmatched(right.offset, right.rows());
        if rows.is_empty() {
            return Ok(());
        }
        let batch = self.op.null_extend_right(&right.batch, &rows)?;
        self.write(&batch)
    }

    fn load(
        &mut self,
        reader: &ChunkReader,
        range: RowRange,
        tag: &'static str,
    ) -> Result<Chunk, ExecError> {
        let batch = reader.read(range)?;
        let guard = self.account(batch.estimated_bytes(), tag)?;
        self.stats.chunks_read += 1;
        Ok(Chunk {
            batch,
            offset: range.low.saturating_sub(1) as usize,
            _guard: guard,
        })
    }

    /// The merged batch is accounted while it is written, then released.
    fn write(&mut self, batch: &RowBatch) -> Result<(), ExecError> {
        let _guard = self.account(batch.estimated_bytes(), "merged_batch")?;
        let rows = self.out.write_batch(batch, self.header_pending)?;
        self.header_pending = false;
        self.stats.batches_written += 1;
        self.stats.rows_written += rows;
        Ok(())
    }

    fn account(
        &self,
        bytes: usize,
        tag: &'static str,
    ) -> Result<Option<BudgetGuardImpl>, ExecError> {
        match self.budget.acquire(bytes, tag) {
            Ok(guard) => Ok(Some(guard)),
            Err(e) if self.enforce_budget => Err(ExecError::Budget(e)),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "estimate exceeded the budget; continuing");
                Ok(None)
            }
        }
    }
}
