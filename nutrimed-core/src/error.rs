use thiserror::Error;

/// Failures at the output edge: PDF encoding and writing reports to disk.
/// Parsing itself never fails.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF encoding failed: {0}")]
    Pdf(String),

    #[error("Invalid image: {0}")]
    Image(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
