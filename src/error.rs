use crate::llm::LLMProvider;

/// Result type for interpreter operations
pub type Result<T> = std::result::Result<T, InterpreterError>;

/// Error types surfaced by the interpreter library
#[derive(thiserror::Error, Debug)]
pub enum InterpreterError {
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Analysis(String),

    #[error("No video loaded")]
    NoActiveVideo,

    #[error("Chapter index {0} out of range")]
    ChapterOutOfRange(usize),

    #[error("LLM error from {provider:?}: {message}")]
    Llm {
        provider: LLMProvider,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata lookup failed: {0}")]
    Metadata(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl InterpreterError {
    pub fn llm(provider: LLMProvider, message: impl Into<String>) -> Self {
        Self::Llm {
            provider,
            message: message.into(),
        }
    }
}
