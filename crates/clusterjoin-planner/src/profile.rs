//! Bounded head sample of one dataset.

use std::path::{Path, PathBuf};

use clusterjoin_core::schema::Schema;
use clusterjoin_io::ChunkReader;

use crate::error::{PlanError, Result};

/// What the first `sample_rows` data rows of a file tell us.
#[derive(Debug, Clone)]
pub struct SampleProfile {
    path: PathBuf,
    schema: Schema,
    rows: usize,
    estimated_bytes: usize,
}

impl SampleProfile {
    /// Read at most `sample_rows` data rows from the head of `path`.
    pub fn read(path: impl AsRef<Path>, sample_rows: usize, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        let sample = ChunkReader::new(path, delimiter).read_head(sample_rows)?;
        Ok(Self {
            path: path.to_path_buf(),
            schema: sample.schema(),
            rows: sample.num_rows(),
            estimated_bytes: sample.estimated_bytes(),
        })
    }

    /// Header of the sampled file.
    pub fn columns(&self) -> &Schema {
        &self.schema
    }

    pub fn sampled_rows(&self) -> usize {
        self.rows
    }

    /// Estimated in-memory bytes per row. Fails for a sample without rows.
    pub fn memory_per_row(&self) -> Result<f64> {
        if self.rows == 0 {
            return Err(PlanError::EmptySample(self.path.display().to_string()));
        }
        Ok(self.estimated_bytes as f64 / self.rows as f64)
    }

    /// `memory_per_row`, or `default` when the sample is empty.
    pub fn memory_per_row_or(&self, default: u64) -> f64 {
        match self.memory_per_row() {
            Ok(m) => m,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, default, "using default per-row footprint");
                default as f64
            }
        }
    }
}
