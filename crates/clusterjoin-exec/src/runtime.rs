//! Runtime: validate the inputs, plan the clusters, and run the loop.
//!
//! `prepare` does everything that can fail before the first output byte:
//! - both paths must exist
//! - the key must be a column of both sampled headers
//! - row counts and per-row footprints feed the cluster-size estimate
//!
//! `run` executes a `PreparedJoin` and emits a `RunManifest`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

use clusterjoin_core::config::JoinConfig;
use clusterjoin_core::hash::hash_plan;
use clusterjoin_core::join::{JoinSpec, JoinTypeParseError};
use clusterjoin_core::manifest::RunManifest;
use clusterjoin_core::schema::Schema;
use clusterjoin_io::{count_rows, ChunkReader, CsvWriter};
use clusterjoin_mem::MemoryBudgetImpl;
use clusterjoin_operators::traits::OpError;
use clusterjoin_operators::HashJoin;
use clusterjoin_planner::{estimate_cluster_plan, Estimate, EstimateInput, PlanError, SampleProfile};

use crate::executor::BlockNestedLoop;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("key column '{column}' not found in {}", .file.display())]
    KeyColumnMissing { column: String, file: PathBuf },

    #[error("unsupported join kind: {0}")]
    UnsupportedJoinKind(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("planning: {0}")]
    Plan(#[from] PlanError),

    #[error("operator exec: {0}")]
    Operator(#[from] OpError),

    #[error("i/o: {0}")]
    Io(#[from] clusterjoin_io::error::Error),

    #[error("{0}")]
    Budget(#[from] clusterjoin_mem::error::Error),

    #[error("hashing error: {0}")]
    Hash(String),
}

impl ExecError {
    /// Rejected before any output was produced.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExecError::InputNotFound(_)
                | ExecError::KeyColumnMissing { .. }
                | ExecError::UnsupportedJoinKind(_)
                | ExecError::Config(_)
        )
    }
}

impl From<JoinTypeParseError> for ExecError {
    fn from(e: JoinTypeParseError) -> Self {
        ExecError::UnsupportedJoinKind(e.0)
    }
}

impl From<clusterjoin_core::error::Error> for ExecError {
    fn from(e: clusterjoin_core::error::Error) -> Self {
        ExecError::Config(e.to_string())
    }
}

/// Facts about one input, fixed once profiled.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetProfile {
    pub path: PathBuf,
    pub schema: Schema,
    /// Data rows, header excluded.
    pub nrows: u64,
    pub sampled_rows: usize,
    pub memory_per_row: f64,
}

/// A validated join with its cluster plan, ready to run.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedJoin {
    pub spec: JoinSpec,
    pub left: DatasetProfile,
    pub right: DatasetProfile,
    pub estimate: Estimate,
    pub output_schema: Schema,
}

/// Engine owns the configuration; each run gets a fresh memory budget.
pub struct Engine {
    cfg: JoinConfig,
}

impl Engine {
    pub fn new(cfg: JoinConfig) -> Result<Self, ExecError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &JoinConfig {
        &self.cfg
    }

    /// Validate both inputs and compute the cluster plan.
    pub fn prepare(
        &self,
        file1: impl AsRef<Path>,
        file2: impl AsRef<Path>,
        spec: JoinSpec,
    ) -> Result<PreparedJoin, ExecError> {
        let (file1, file2) = (file1.as_ref(), file2.as_ref());
        for path in [file1, file2] {
            if !path.is_file() {
                return Err(ExecError::InputNotFound(path.to_path_buf()));
            }
        }

        let sample1 = SampleProfile::read(file1, self.cfg.sample_rows, self.cfg.delimiter)?;
        let sample2 = SampleProfile::read(file2, self.cfg.sample_rows, self.cfg.delimiter)?;
        for (sample, path) in [(&sample1, file1), (&sample2, file2)] {
            if !sample.columns().contains(&spec.key) {
                return Err(ExecError::KeyColumnMissing {
                    column: spec.key.clone(),
                    file: path.to_path_buf(),
                });
            }
        }

        let left = self.profile(file1, &sample1)?;
        let right = self.profile(file2, &sample2)?;

        let estimate = estimate_cluster_plan(&EstimateInput {
            memory_per_row_left: left.memory_per_row,
            memory_per_row_right: right.memory_per_row,
            memory_available: self.cfg.memory_available,
            nrows_left: left.nrows,
            nrows_right: right.nrows,
            cluster_size_override: self.cfg.cluster_size_override,
        })?;

        let output_schema =
            HashJoin::new(spec.key.as_str(), spec.join_type, &left.schema, &right.schema)?
                .output_schema();

        #[cfg(feature = "tracing")]
        tracing::info!(
            left = %left.path.display(),
            right = %right.path.display(),
            key = %spec.key,
            kind = %spec.join_type,
            cluster_size = estimate.plan.cluster_size,
            nclusters_left = estimate.plan.nclusters_left,
            nclusters_right = estimate.plan.nclusters_right,
            "join prepared"
        );

        Ok(PreparedJoin {
            spec,
            left,
            right,
            estimate,
            output_schema,
        })
    }

    fn profile(&self, path: &Path, sample: &SampleProfile) -> Result<DatasetProfile, ExecError> {
        let nrows = count_rows(path).map_err(clusterjoin_io::error::Error::from)?;
        Ok(DatasetProfile {
            path: path.to_path_buf(),
            schema: sample.columns().clone(),
            nrows,
            sampled_rows: sample.sampled_rows(),
            memory_per_row: sample.memory_per_row_or(self.cfg.default_row_bytes),
        })
    }

    /// Stream the join of a prepared pair into `out`.
    pub fn run<W: Write>(
        &self,
        prepared: &PreparedJoin,
        out: &mut CsvWriter<W>,
    ) -> Result<RunManifest, ExecError> {
        let plan = prepared.estimate.plan;
        let plan_hash =
            hash_plan(&prepared.spec, &plan).map_err(|e| ExecError::Hash(e.to_string()))?;
        let manifest = RunManifest::new(plan_hash, prepared.spec.clone(), plan, now_millis());

        let op = HashJoin::new(
            prepared.spec.key.as_str(),
            prepared.spec.join_type,
            &prepared.left.schema,
            &prepared.right.schema,
        )?;
        let left = ChunkReader::new(&prepared.left.path, self.cfg.delimiter);
        let right = ChunkReader::new(&prepared.right.path, self.cfg.delimiter);
        let budget = MemoryBudgetImpl::new(self.cfg.memory_available);

        let stats = BlockNestedLoop::new(
            &op,
            &left,
            &right,
            plan,
            budget,
            self.cfg.enforce_budget,
            out,
        )
        .run()?;

        Ok(manifest.finish(now_millis(), stats))
    }

    /// `prepare` followed by `run`.
    pub fn join<W: Write>(
        &self,
        file1: impl AsRef<Path>,
        file2: impl AsRef<Path>,
        spec: JoinSpec,
        out: &mut CsvWriter<W>,
    ) -> Result<RunManifest, ExecError> {
        let prepared = self.prepare(file1, file2, spec)?;
        self.run(&prepared, out)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
