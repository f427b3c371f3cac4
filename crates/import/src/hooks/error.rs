use derive_more::{Display, Error};

/// A hook error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for post-import hooks.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading or writing release documents failed.
    #[display("search index failure")]
    Index,
    /// The purge request could not be built or sent.
    #[display("purge request to {_0} failed")]
    Request(#[error(not(source))] String),
    #[display("purge endpoint answered with HTTP status {_0}")]
    HttpStatus(#[error(not(source))] u16),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Index | Self::Request(_) => true,
            Self::HttpStatus(code) => *code >= 500 || *code == 429,
        }
    }
}
