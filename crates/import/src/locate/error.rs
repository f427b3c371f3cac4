//! Error types for the [`locate`](super) module.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A locate error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for locate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies why an input produced no archives.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Neither an existing file, a directory nor an HTTP(S) URL.
    #[display("unrecognized input: {_0}")]
    Unrecognized(#[error(not(source))] String),
    /// A URL without an `authors/id/A/AU/AUTHOR/` path.
    #[display("URL does not point into an author directory: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// The request could not be sent or the body not received.
    #[display("could not fetch {_0}")]
    Fetch(#[error(not(source))] String),
    /// The mirror answered with an unexpected status code.
    #[display("unexpected HTTP status {_0}")]
    HttpStatus(#[error(not(source))] u16),
    #[display("I/O error at {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_)) || matches!(self, Self::HttpStatus(code) if *code >= 500)
    }
}
