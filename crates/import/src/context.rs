use relidx_model::Status;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for a single import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Mirror root holding `modules/` and `indices/`.
    pub cpan: PathBuf,
    /// Download cache for archives given as URLs.
    pub cache: PathBuf,
    /// Status of every imported release, unless backpan detection says
    /// otherwise.
    pub status: Status,
    pub detect_backpan: bool,
    /// Skip archives that already have a release document.
    pub skip: bool,
    /// Recompute the latest release of each imported distribution.
    pub latest: bool,
    pub bulk_size: usize,
    /// Ignore archives found in directories that are older than this.
    pub age: Option<Duration>,
    /// Pause after every imported archive.
    pub throttle: Option<Duration>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cpan: PathBuf::from("CPAN"),
            cache: PathBuf::from(".cache"),
            status: Status::Cpan,
            detect_backpan: false,
            skip: false,
            latest: false,
            bulk_size: relidx_index::DEFAULT_BULK_SIZE,
            age: None,
            throttle: None,
        }
    }
}

impl Context {
    pub fn permissions_feed(&self) -> PathBuf {
        self.cpan.join("modules").join("06perms.txt")
    }

    pub fn packages_feed(&self) -> PathBuf {
        self.cpan.join("modules").join("02packages.details.txt.gz")
    }

    pub fn backpan_feed(&self) -> PathBuf {
        self.cpan.join("indices").join("find-ls.gz")
    }

    /// Where a downloaded archive is kept: `<cache>/authors/id/<pathname>`.
    pub fn cache_path(&self, pathname: impl AsRef<Path>) -> PathBuf {
        self.cache.join("authors").join("id").join(pathname)
    }
}
