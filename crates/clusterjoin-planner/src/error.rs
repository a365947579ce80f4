use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("sample of {0} has no data rows")]
    EmptySample(String),

    #[error("invalid estimator input: {0}")]
    Config(String),

    #[error("reading sample: {0}")]
    Io(#[from] clusterjoin_io::error::Error),
}
