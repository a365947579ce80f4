use thiserror::Error;

/// Result type local to clusterjoin-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed row {row} in {path}: {msg}")]
    Row { path: String, row: u64, msg: String },
}
