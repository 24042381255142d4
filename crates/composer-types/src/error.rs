use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ComposerError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),

    #[error("{0}")]
    Other(String),
}

impl ComposerError {
    /// True for the error produced when an in-flight call was aborted.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ComposerError::Cancelled)
    }
}

impl From<serde_json::Error> for ComposerError {
    fn from(e: serde_json::Error) -> Self {
        ComposerError::Serialization(e.to_string())
    }
}
