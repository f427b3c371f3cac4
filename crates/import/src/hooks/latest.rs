use crate::hooks::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use relidx_index::{IndexHandle, ReleaseFilter};
use relidx_model::{Document, Maturity, Status};

/// Recompute which release of a distribution is the latest.
#[async_trait]
pub trait LatestRecompute: Send + Sync {
    /// Returns the number of release documents that changed status.
    async fn recompute(&self, distribution: &str) -> Result<usize>;
}

/// Among the releases of a distribution still on the primary mirror
/// (`cpan` or `latest`), the newest stable one becomes `latest` and every
/// other one `cpan`. Developer releases are never `latest`. Backpan releases
/// are left alone.
#[derive(Clone)]
pub struct StatusLatest {
    index: IndexHandle,
}

impl StatusLatest {
    pub fn new(index: IndexHandle) -> Self {
        Self { index }
    }
}

#[async_trait]
impl LatestRecompute for StatusLatest {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn recompute(&self, distribution: &str) -> Result<usize> {
        let releases = self
            .index
            .find_releases(&ReleaseFilter::new().distribution(distribution))
            .await
            .or_raise(|| ErrorKind::Index)?;
        let mut candidates = releases
            .into_iter()
            .filter(|release| matches!(release.status, Status::Cpan | Status::Latest))
            .collect::<Vec<_>>();
        // Oldest first, so the newest stable release is the last one.
        let newest = candidates.iter().rposition(|release| release.maturity == Maturity::Released);
        let mut changed = 0;
        for (position, release) in candidates.iter_mut().enumerate() {
            let status = if Some(position) == newest { Status::Latest } else { Status::Cpan };
            if release.status == status {
                continue;
            }
            release.status = status;
            self.index.put(&Document::from(release.clone())).await.or_raise(|| ErrorKind::Index)?;
            changed += 1;
        }
        if changed > 0 {
            let latest = newest.map(|position| candidates[position].name.as_str());
            tracing::debug!(changed, ?latest, "Updated latest release");
        }
        Ok(changed)
    }
}
