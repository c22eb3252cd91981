use thiserror::Error;

#[derive(Error, Debug)]
pub enum JacorsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse XML at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Unknown coverage bucket: '{0}'. Supported: nocovered, partiallycovered, fullcovered")]
    InvalidBucket(String),
}

pub type Result<T> = std::result::Result<T, JacorsError>;
