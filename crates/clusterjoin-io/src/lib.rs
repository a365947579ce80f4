#![forbid(unsafe_code)]
//! clusterjoin-io: the only crate that touches input and output files.
//!
//! - `readers::csv`: row counting, bounded head samples, and ranged chunk reads.
//! - `writers::csv`: streaming delimited-text output with a per-batch header flag.
//! - `buf`: bounded buffered reading for the line counter.

pub mod buf;
pub mod error;
pub mod readers;
pub mod writers;

pub use readers::csv::{count_rows, ChunkReader};
pub use writers::csv::CsvWriter;
