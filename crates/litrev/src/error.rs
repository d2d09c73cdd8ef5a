use thiserror::Error;

#[derive(Debug, Error)]
pub enum LitrevError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    Api(String, String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("bibtex error: {0}")]
    Bibtex(String),

    #[error("invalid arXiv ID: {0}")]
    InvalidArxivId(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("no record found for '{0}'")]
    NotFound(String),

    #[error("gave up after {trials} trials: {last}")]
    RetriesExhausted { trials: u32, last: String },

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, LitrevError>;
