use derive_more::{Display, Error};
use std::path::PathBuf;

/// A release model error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for release model operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No `.meta` file next to the archive.
    #[display("metadata sidecar not found: {}", _0.display())]
    MissingSidecar(#[error(not(source))] PathBuf),
    #[display("metadata sidecar is not valid META JSON: {}", _0.display())]
    InvalidSidecar(#[error(not(source))] PathBuf),
    #[display("I/O error at {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
