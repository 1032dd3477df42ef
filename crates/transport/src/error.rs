use thiserror::Error;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors raised while setting up the HTTP dispatcher.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Host, port and path do not form a valid URL.
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The dispatcher was created outside of a tokio runtime.
    #[error("HTTP dispatcher must be created within a tokio runtime")]
    NoRuntime,
}
