use derive_more::{Display, Error};

/// A per-archive error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for importing a single archive.
pub type Result<T> = std::result::Result<T, Error>;

/// The step of the per-archive pipeline that failed.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The path doesn't look like `A/AU/AUTHOR/Dist-Version.ext`.
    #[display("could not identify archive")]
    Identity,
    #[display("could not read release")]
    Model,
    #[display("could not classify release")]
    Feed,
    #[display("could not write to search index")]
    Index,
    /// The latest-release recompute for the distribution failed.
    #[display("could not recompute latest release")]
    Latest,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Index | Self::Latest)
    }
}
