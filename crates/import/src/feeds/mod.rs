//! Offline mirror feeds: author permissions and the backpan listing.
//!
//! Both indexes are built at most once per run, on first use. Parsing happens
//! on the blocking thread pool since the feeds are read synchronously through
//! a decompressor.

mod backpan;
pub mod error;
mod permissions;

use crate::Context;
use crate::feeds::error::{ErrorKind, Result};
use exn::ResultExt;
use relidx_compress::FeedLines;
use relidx_model::{Permissions, Status};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// The feeds used by one import run.
#[derive(Debug)]
pub struct Feeds {
    perms_path: PathBuf,
    packages_path: PathBuf,
    backpan_path: PathBuf,
    status: Status,
    detect_backpan: bool,
    permissions: OnceCell<Permissions>,
    backpan: OnceCell<HashSet<String>>,
}

impl Feeds {
    pub fn new(ctx: &Context) -> Self {
        Self {
            perms_path: ctx.permissions_feed(),
            packages_path: ctx.packages_feed(),
            backpan_path: ctx.backpan_feed(),
            status: ctx.status,
            detect_backpan: ctx.detect_backpan,
            permissions: OnceCell::new(),
            backpan: OnceCell::new(),
        }
    }

    /// The permissions index. Never fails: unusable feeds are logged and
    /// leave the index empty, which disables authorization checks.
    pub async fn permissions(&self) -> &Permissions {
        self.permissions
            .get_or_init(|| async {
                let (perms, packages) = (self.perms_path.clone(), self.packages_path.clone());
                let permissions = tokio::task::spawn_blocking(move || permissions::load(&perms, &packages))
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Permissions loader did not finish");
                        Permissions::new()
                    });
                if permissions.is_empty() {
                    tracing::warn!("No permissions data available; authorization checks are disabled");
                } else {
                    tracing::info!(modules = permissions.len(), "Loaded permissions index");
                }
                permissions
            })
            .await
    }

    /// `AUTHOR/filename` of every archive still on the primary mirror.
    pub async fn backpan(&self) -> Result<&HashSet<String>> {
        self.backpan
            .get_or_try_init(|| async {
                let path = self.backpan_path.clone();
                tokio::task::spawn_blocking(move || backpan::load(&path)).await.or_raise(|| ErrorKind::Join)?
            })
            .await
    }

    /// Status for the archive `author/filename`: the configured default
    /// unless backpan detection is on and the mirror no longer lists it.
    pub async fn detect_status(&self, author: &str, filename: &str) -> Result<Status> {
        if !self.detect_backpan {
            return Ok(self.status);
        }
        let listed = self.backpan().await?.contains(&format!("{author}/{filename}"));
        Ok(if listed { self.status } else { Status::Backpan })
    }
}

/// Open a feed, telling a missing file apart from an unreadable one.
pub(crate) fn open(path: &Path) -> Result<FeedLines> {
    relidx_compress::open_lines(path).map_err(|e| {
        let kind = match &*e {
            relidx_compress::error::ErrorKind::NotFound(_) => ErrorKind::Missing(path.to_path_buf()),
            _ => ErrorKind::Read(path.to_path_buf()),
        };
        e.raise(kind)
    })
}

/// Call `f` for every non-empty row after the header block, which ends at
/// the first blank line.
pub(crate) fn for_each_row(path: &Path, mut f: impl FnMut(&str)) -> Result<()> {
    let mut in_header = true;
    for line in open(path)? {
        let line = line.or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
        let row = line.trim();
        if in_header {
            in_header = !row.is_empty();
        } else if !row.is_empty() {
            f(row);
        }
    }
    Ok(())
}
