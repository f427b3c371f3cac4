use derive_more::{Display, Error};
use std::path::PathBuf;

/// A feed error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for feed loading.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The feed file is not on the mirror.
    #[display("feed not found: {}", _0.display())]
    Missing(#[error(not(source))] PathBuf),
    /// The feed exists but could not be read to the end.
    #[display("could not read feed: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// The blocking loader task panicked or was cancelled.
    #[display("feed loader did not finish")]
    Join,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read(_))
    }
}
