//! Streaming delimited-text writer.
//!
//! Each `write_batch` call is flushed before it returns, so batches reach the
//! sink strictly in call order and never interleave.

use std::io::Write;

use clusterjoin_core::types::{RowBatch, Scalar};

use crate::error::Result;

pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self::with_delimiter(writer, b',')
    }

    pub fn with_delimiter(writer: W, delimiter: u8) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .delimiter(delimiter)
                .has_headers(false)
                .from_writer(writer),
        }
    }

    /// Write `batch`, preceded by its column names when `include_header` is set.
    /// No row index column is ever written. Returns the number of data rows.
    pub fn write_batch(&mut self, batch: &RowBatch, include_header: bool) -> Result<u64> {
        if include_header {
            self.writer
                .write_record(batch.columns.iter().map(|c| c.name.as_str()))?;
        }
        let nrows = batch.num_rows();
        for r in 0..nrows {
            self.writer.write_record(batch.columns.iter().map(|c| field(&c.values[r])))?;
        }
        self.writer.flush()?;
        Ok(nrows as u64)
    }

    /// Flush and hand back the sink.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

fn field(v: &Scalar) -> &str {
    v.as_str().unwrap_or("")
}
