use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("corpus store not found at {0}")]
    Unavailable(std::path::PathBuf),

    #[error("corpus row is missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "lancedb")]
    #[error("lancedb error: {0}")]
    Lance(#[from] ::lancedb::Error),

    #[error("{0}")]
    Other(String),
}
