//! Error types for CGI polling.

use thiserror::Error;

/// Error type for HTTP operations.
///
/// These never end a poller; they are reported and the next call proceeds.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Network connection failed.
    ///
    /// This includes connection refused, TLS failures and truncated
    /// responses.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Error type for one CGI call.
#[derive(Debug, Error)]
pub enum CgiError {
    /// The request could not be completed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The endpoint URL is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The digest challenge could not be answered.
    #[error("Digest authentication failed: {0}")]
    Digest(String),
}
