use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("missing column(s) in {file}: {columns}")]
    MissingColumn { file: String, columns: String },

    #[error("no usable records {0}")]
    NoUsableRecords(String),

    #[error("external tool failed: {0}")]
    ExternalTool(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MetaError>;
