//! Readers that materialize one chunk of a dataset as a `RowBatch`.

pub mod csv;
