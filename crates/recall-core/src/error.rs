//! Session error types.
//!
//! Failures here come from the durable token store. They are rare and
//! propagated to the caller instead of being turned into notifications.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing session state.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The token file could not be read.
    #[error("failed to read token from {path}: {source}")]
    ReadToken {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The token file could not be written or removed.
    #[error("failed to write token to {path}: {source}")]
    WriteToken {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
