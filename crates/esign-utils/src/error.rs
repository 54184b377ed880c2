use thiserror::Error;

#[derive(Error, Debug)]
pub enum EsignError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page number {page}: document has {page_count} page(s)")]
    InvalidPage { page: u32, page_count: u32 },

    #[error("Invalid signature placement: {0}")]
    InvalidPlacement(String),

    #[error("Unsupported signature image: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}

impl From<lopdf::Error> for EsignError {
    fn from(e: lopdf::Error) -> Self {
        EsignError::OperationError(e.to_string())
    }
}
