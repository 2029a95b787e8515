//! Client error types.
//!
//! These cover failures the request pipeline does not handle itself. Refused
//! requests (any non-2xx answer) are not errors; they come back as
//! [`crate::Outcome::Failure`] after a notification has been published.

use thiserror::Error;

use recall_core::SessionError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL or a derived endpoint URL is invalid.
    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(String),

    /// A successful response carried a body of the wrong shape.
    #[error("failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// The push connection could not be opened.
    #[error("event stream error: {0}")]
    EventStream(String),

    /// Reading or writing the stored token failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ClientError {
    /// Returns `true` if the server was never reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
