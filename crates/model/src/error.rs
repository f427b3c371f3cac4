//! Model Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A model error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The name does not look like a release archive at all.
    #[display("not a release archive: {_0}")]
    NotAnArchive(#[error(not(source))] String),
    /// The path has no `authors/id/A/AU/AUTHOR/` segment to take an author from.
    #[display("no author in archive path: {_0}")]
    MissingAuthor(#[error(not(source))] String),
    /// Distribution metadata could not be parsed.
    #[display("invalid release metadata")]
    InvalidMetadata,
    /// A status string that isn't one of `latest`, `cpan` or `backpan`.
    #[display("unknown release status: {_0}")]
    UnknownStatus(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Everything in here is a pure function of its input.
        false
    }
}
