//! Errors that end an import run.

use derive_more::{Display, Error};

/// A run error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for the binary.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration could not be loaded, or a flag overrides it with
    /// something unusable.
    #[display("invalid configuration")]
    Config,
    /// The search index could not be opened.
    #[display("could not open search index")]
    Index,
    /// An HTTP client could not be built.
    #[display("could not set up HTTP client")]
    Http,
    /// The import stream reported a failure of the run itself.
    #[display("import run failed")]
    Run,
}
