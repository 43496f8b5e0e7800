//! Error types for moodscope

/// Result type alias using moodscope's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for moodscope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or unreadable corpus, stop-word, template or dictionary input
    #[error("input error: {0}")]
    Input(String),

    /// Segmentation failed for a single document
    #[error("tokenize error: {0}")]
    Tokenize(String),

    /// Vocabulary construction or lookup errors
    #[error("vocabulary error: {0}")]
    Vocabulary(String),

    /// Degenerate training input
    #[error("training error: {0}")]
    Training(String),

    /// Missing, corrupt or mismatched model artifacts
    #[error("model error: {0}")]
    Model(String),

    /// No model is loaded, so nothing can be classified
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binary artifact encoding errors
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

impl Error {
    /// Create a new input error
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Create a new tokenize error
    pub fn tokenize(msg: impl Into<String>) -> Self {
        Self::Tokenize(msg.into())
    }

    /// Create a new vocabulary error
    pub fn vocabulary(msg: impl Into<String>) -> Self {
        Self::Vocabulary(msg.into())
    }

    /// Create a new training error
    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error means the service cannot answer at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Model(_))
    }
}
