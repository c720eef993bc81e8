//! Error types for the fetch and search pipeline.

use std::time::Duration;

/// All errors that can occur while talking to the forum.
///
/// Extraction never produces an error: malformed or unexpected HTML simply
/// yields fewer (or zero) results.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// Connection-level failure (DNS, refused, reset, TLS, body read).
    #[error("Transport error: {0}")]
    Transport(String),

    /// No complete response arrived within the configured timeout.
    #[error("Request timeout after {}s", timeout.as_secs())]
    Timeout { timeout: Duration },

    /// The redirect chain was longer than the configured bound.
    #[error("Too many redirects (limit {max})")]
    TooManyRedirects { max: usize },

    /// A request URL or redirect Location could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A caller-supplied header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl FetchError {
    /// Classify a reqwest error into a transport or timeout failure.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout { timeout }
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(e: url::ParseError) -> Self {
        FetchError::InvalidUrl(e.to_string())
    }
}

/// Convenience result type.
pub type Result<T, E = FetchError> = std::result::Result<T, E>;
