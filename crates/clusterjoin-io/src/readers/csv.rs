//! CSV row counting and ranged chunk reads.
//!
//! Chunks are produced by re-scanning the file from the start with a
//! `RowRange` predicate. The scan stops at the first row past `high`, so early
//! chunks are cheap; the output is the same as filtering a full scan.

use std::path::{Path, PathBuf};

use clusterjoin_core::cluster::RowRange;
use clusterjoin_core::schema::Schema;
use clusterjoin_core::types::{RowBatch, Scalar};

use crate::buf::{bounded_from_path, count_lines, SCAN_BUFFER_BYTES};
use crate::error::{Error, Result};

/// Number of data rows in `path`: line count minus the header line.
///
/// This is a raw line count and makes no assumption about field content.
pub fn count_rows<P: AsRef<Path>>(path: P) -> std::io::Result<u64> {
    let reader = bounded_from_path(path, SCAN_BUFFER_BYTES)?;
    Ok(count_lines(reader)?.saturating_sub(1))
}

/// Reads contiguous row ranges of one delimited-text file.
#[derive(Debug, Clone)]
pub struct ChunkReader {
    path: PathBuf,
    delimiter: u8,
}

impl ChunkReader {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<csv::Reader<std::fs::File>> {
        let rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_path(&self.path)?;
        Ok(rdr)
    }

    /// Column names from the header line. An empty file has no columns.
    pub fn schema(&self) -> Result<Schema> {
        let mut rdr = self.open()?;
        let headers = rdr.headers()?;
        Ok(Schema::new(headers.iter().map(str::to_string).collect()))
    }

    /// Header plus every data row whose 1-based index lies in `range`.
    ///
    /// A range reaching past the end of the file yields fewer rows, not an error.
    pub fn read(&self, range: RowRange) -> Result<RowBatch> {
        let mut rdr = self.open()?;
        let schema = Schema::new(rdr.headers()?.iter().map(str::to_string).collect());
        let mut batch = RowBatch::empty(&schema);

        let mut record = csv::StringRecord::new();
        let mut row_index = 0u64;
        while rdr.read_record(&mut record)? {
            row_index += 1;
            if range.is_past(row_index) {
                break;
            }
            if !range.keep(row_index) {
                continue;
            }
            let row = record.iter().map(Scalar::from_field).collect();
            batch.push_row(row).map_err(|msg| Error::Row {
                path: self.path.display().to_string(),
                row: row_index,
                msg,
            })?;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            path = %self.path.display(),
            low = range.low,
            high = range.high,
            rows = batch.num_rows(),
            "read chunk"
        );
        Ok(batch)
    }

    /// The first `n` data rows (the profiling sample).
    pub fn read_head(&self, n: usize) -> Result<RowBatch> {
        if n == 0 {
            return Ok(RowBatch::empty(&self.schema()?));
        }
        self.read(RowRange::new(1, n as u64))
    }

    /// Every data row.
    pub fn read_all(&self) -> Result<RowBatch> {
        self.read(RowRange::all())
    }
}
