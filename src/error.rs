//! Error types for the FinTrack client library.

/// All errors that can occur when using the FinTrack client.
#[derive(Debug, thiserror::Error)]
pub enum FinTrackError {
    /// The HTTP transport failed (connection, TLS, body read).
    #[cfg(any(feature = "async", feature = "blocking"))]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status code.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, or a placeholder when it could not be read.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Login form encoding failed.
    #[cfg(any(feature = "async", feature = "blocking"))]
    #[error("form encoding error: {0}")]
    FormEncoding(#[from] serde_urlencoded::ser::Error),

    /// An authenticated endpoint was called without an access token.
    #[error("no access token available; log in first")]
    MissingToken,

    /// A caller-supplied value was rejected before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Session persistence failed.
    #[error("session storage error: {0}")]
    Session(Box<dyn core::error::Error + Send + Sync>),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, FinTrackError>;
