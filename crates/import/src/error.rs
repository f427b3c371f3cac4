//! Import Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Each submodule classifies its own
//! failures; the kinds here say which stage of a run gave up.

use derive_more::{Display, Error};

/// An import error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A single archive could not be imported. Never fatal to a run.
    #[display("could not import archive")]
    Archive,
    /// An offline feed required for this run could not be loaded.
    #[display("could not load mirror feed")]
    Feed,
    /// The search index refused the end-of-run commit or refresh.
    #[display("search index failure")]
    Index,
    /// The CDN purge after the run failed.
    #[display("cache purge failed")]
    Purge,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Index | Self::Purge)
    }
}
