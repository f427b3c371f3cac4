//! Index Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Backends (such as the SQLite store) raise their own
//! errors into one of these kinds so callers only deal with a single type.

use derive_more::{Display, Error};

/// An index error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The index could not be reached or opened (locked, missing, offline).
    #[display("index unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
    /// A document could not be encoded or decoded.
    #[display("could not serialize document {_0}")]
    Serialization(#[error(not(source))] String),
    /// A batch of documents was not committed.
    #[display("bulk commit of {_0} documents failed")]
    Bulk(#[error(not(source))] usize),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    Backend(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Backend(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Unavailable("locked".into()).is_retryable());
        assert!(!ErrorKind::Serialization("abc".into()).is_retryable());
        assert!(!ErrorKind::Bulk(3).is_retryable());
    }
}
