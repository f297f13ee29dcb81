//! Error handling for the resume ranker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeRankerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty document: {role} text is empty after normalization")]
    EmptyDocument { role: DocumentRole },

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Deadline exceeded after {elapsed_ms} ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    #[error("Batch failed: all {failed} candidate documents failed")]
    BatchFailed { failed: usize },

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Which side of a comparison a document plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentRole {
    Resume,
    JobDescription,
}

impl std::fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentRole::Resume => write!(f, "resume"),
            DocumentRole::JobDescription => write!(f, "job description"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResumeRankerError>;

impl ResumeRankerError {
    pub fn empty(role: DocumentRole) -> Self {
        ResumeRankerError::EmptyDocument { role }
    }

    pub fn is_empty_document(&self) -> bool {
        matches!(self, ResumeRankerError::EmptyDocument { .. })
    }
}

/// Model2Vec reports loader failures through anyhow
impl From<anyhow::Error> for ResumeRankerError {
    fn from(err: anyhow::Error) -> Self {
        ResumeRankerError::ModelUnavailable(err.to_string())
    }
}

/// Convert candle core errors to our custom error type
impl From<candle_core::Error> for ResumeRankerError {
    fn from(err: candle_core::Error) -> Self {
        ResumeRankerError::ModelError(err.to_string())
    }
}
