//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of data rows read when profiling a dataset.
pub const DEFAULT_SAMPLE_ROWS: usize = 100;

/// Per-row footprint assumed for a side whose sample has no rows.
pub const DEFAULT_ROW_BYTES: u64 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Memory available to the join (bytes). The cluster size is derived from
    /// 80% of this value; it is fixed for the lifetime of a run.
    pub memory_available: usize,

    /// Data rows read from the head of each file to estimate per-row footprint.
    pub sample_rows: usize,

    /// Fallback per-row footprint when a sample is empty.
    pub default_row_bytes: u64,

    /// Forces the cluster size instead of estimating it.
    pub cluster_size_override: Option<u64>,

    /// Abort when a chunk cannot be accounted against the budget.
    /// When false the overrun is logged and execution continues.
    pub enforce_budget: bool,

    /// Field delimiter for both inputs and the output.
    pub delimiter: u8,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            memory_available: 512 * 1024 * 1024, // 512 MiB default
            sample_rows: DEFAULT_SAMPLE_ROWS,
            default_row_bytes: DEFAULT_ROW_BYTES,
            cluster_size_override: None,
            enforce_budget: false,
            delimiter: b',',
        }
    }
}

impl JoinConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `CLUSTERJOIN_MEMORY_AVAILABLE`: memory budget in bytes
    /// - `CLUSTERJOIN_SAMPLE_ROWS`: rows sampled per file
    /// - `CLUSTERJOIN_DEFAULT_ROW_BYTES`: per-row fallback for empty samples
    /// - `CLUSTERJOIN_CLUSTER_SIZE`: forced cluster size (rows)
    /// - `CLUSTERJOIN_ENFORCE_BUDGET`: `1`/`true` to abort on budget overrun
    /// - `CLUSTERJOIN_DELIMITER`: single-byte field delimiter
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("CLUSTERJOIN_MEMORY_AVAILABLE") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.memory_available = v;
            }
        }

        if let Ok(s) = std::env::var("CLUSTERJOIN_SAMPLE_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.sample_rows = v;
            }
        }

        if let Ok(s) = std::env::var("CLUSTERJOIN_DEFAULT_ROW_BYTES") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.default_row_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("CLUSTERJOIN_CLUSTER_SIZE") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.cluster_size_override = Some(v);
            }
        }

        if let Ok(s) = std::env::var("CLUSTERJOIN_ENFORCE_BUDGET") {
            cfg.enforce_budget = matches!(s.trim(), "1" | "true" | "TRUE" | "yes");
        }

        if let Ok(s) = std::env::var("CLUSTERJOIN_DELIMITER") {
            if let Ok(d) = parse_delimiter(&s) {
                cfg.delimiter = d;
            }
        }

        cfg
    }

    /// Reject settings the estimator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.memory_available == 0 {
            return Err(Error::Config("memory_available must be positive".into()));
        }
        if self.sample_rows == 0 {
            return Err(Error::Config("sample_rows must be positive".into()));
        }
        if self.default_row_bytes == 0 {
            return Err(Error::Config("default_row_bytes must be positive".into()));
        }
        if self.cluster_size_override == Some(0) {
            return Err(Error::Config("cluster size override must be at least 1".into()));
        }
        Ok(())
    }
}

/// Parse a delimiter given as a single ASCII character (`\t` is accepted too).
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "\\t" | "\t" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(Error::Config(format!(
            "delimiter must be a single ASCII character, got '{s}'"
        ))),
    }
}
