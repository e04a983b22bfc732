//! Error types for PictoQuery

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crate
///
/// Every variant is session-local: after any of them the session that produced
/// it can take the next interaction.
#[derive(Error, Debug)]
pub enum Error {
    /// A question was submitted before any image was uploaded
    #[error("Please upload an image first.")]
    MissingImage,

    /// The outbound completion call failed (network, status, auth, malformed body)
    #[error("Completion request failed: {0}")]
    CompletionRequestFailed(String),

    /// Image type outside the accepted allow-list
    #[error("Unsupported image type: {0} (expected jpeg, png or webp)")]
    UnsupportedImageType(String),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error while reading images or secrets
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// API error from the model server
    #[error("API error: {0}")]
    Api(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout error
    #[error("Request timeout")]
    Timeout,
}

impl Error {
    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a new API error
    pub fn api(msg: impl Into<String>) -> Self {
        Error::Api(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a new unsupported image type error
    pub fn unsupported_image_type(kind: impl Into<String>) -> Self {
        Error::UnsupportedImageType(kind.into())
    }

    /// Create a timeout error
    pub fn timeout() -> Self {
        Error::Timeout
    }

    /// Folds a backend failure into `CompletionRequestFailed`, keeping the
    /// underlying description. Already-folded errors pass through unchanged.
    pub fn into_completion_failure(self) -> Self {
        match self {
            Error::CompletionRequestFailed(msg) => Error::CompletionRequestFailed(msg),
            other => Error::CompletionRequestFailed(other.to_string()),
        }
    }

    /// True for errors that are warnings to the user rather than failures
    pub fn is_warning(&self) -> bool {
        matches!(self, Error::MissingImage)
    }
}
