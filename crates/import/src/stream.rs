use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::feeds::Feeds;
use crate::hooks::{CachePurge, LatestRecompute, NoPurge, StatusLatest};
use crate::locate::{Mirror, locate};
use crate::model::ReleaseModel;
use crate::release::ArchiveImport;
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use relidx_index::{BulkIndexer, IndexHandle, ReleaseFilter};
use relidx_model::{ArchiveIdentity, ReleaseDocument};
use std::path::PathBuf;
use std::sync::Arc;

/// Progress events emitted by [`Importer::run`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete), exactly once, with the
///    number of archives found.
/// 3. [`Skipped`](Self::Skipped), [`Imported`](Self::Imported) or
///    [`Failed`](Self::Failed), once per archive, in discovery order.
/// 4. [`Purged`](Self::Purged), once, unless the purge failed.
/// 5. [`Complete`](Self::Complete), exactly once.
///
/// A failed per-archive import is reported as [`Failed`](Self::Failed) and
/// the run carries on. `Err` items are reserved for the run itself: a
/// missing backpan listing or a failed refresh end the stream early, a
/// failed final commit or purge is reported and the stream continues.
#[derive(Debug)]
pub enum ImportEvent {
    Started,
    DiscoveryComplete(u64),
    /// The index already holds a release for this archive.
    Skipped(PathBuf),
    Imported {
        archive: PathBuf,
        release: Box<ReleaseDocument>,
    },
    Failed {
        archive: PathBuf,
        error: crate::release::error::Error,
    },
    /// Number of surrogate keys purged.
    Purged(usize),
    Complete,
}

/// Runs imports against one index.
#[derive(Clone)]
pub struct Importer {
    ctx: Context,
    index: IndexHandle,
    model: Arc<dyn ReleaseModel>,
    mirror: Arc<dyn Mirror>,
    latest: Option<Arc<dyn LatestRecompute>>,
    purge: Arc<dyn CachePurge>,
}

impl Importer {
    /// With `ctx.latest`, releases are run through [`StatusLatest`] on the
    /// same index; purging is off until [`with_purge`](Self::with_purge).
    pub fn new(ctx: Context, index: IndexHandle, model: Arc<dyn ReleaseModel>, mirror: Arc<dyn Mirror>) -> Self {
        let latest = ctx.latest.then(|| Arc::new(StatusLatest::new(index.clone())) as Arc<dyn LatestRecompute>);
        Self { ctx, index, model, mirror, latest, purge: Arc::new(NoPurge) }
    }

    /// Replace the latest recompute (used whatever `ctx.latest` says).
    pub fn with_latest(mut self, latest: Arc<dyn LatestRecompute>) -> Self {
        self.latest = Some(latest);
        self
    }

    pub fn with_purge(mut self, purge: Arc<dyn CachePurge>) -> Self {
        self.purge = purge;
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Locate every archive in `inputs` and import them one after another.
    pub fn run<'a>(&'a self, inputs: &'a [String]) -> impl Stream<Item = Result<ImportEvent>> + 'a {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            yield Ok(ImportEvent::Started);

            let feeds = Feeds::new(&self.ctx);
            if self.ctx.detect_backpan {
                // Fail before touching the index rather than on the first archive.
                if let Err(e) = feeds.backpan().await.or_raise(|| ErrorKind::Feed) {
                    yield Err(e);
                    return;
                }
            }

            let discovery = locate(inputs, &self.ctx, self.mirror.as_ref()).await;
            // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
            yield Ok(ImportEvent::DiscoveryComplete(u64::try_from(discovery.archives.len()).unwrap_or(0)));

            let step = ArchiveImport {
                ctx: &self.ctx,
                index: &self.index,
                model: self.model.as_ref(),
                feeds: &feeds,
                latest: self.latest.as_deref(),
            };
            let mut bulk = BulkIndexer::new(self.index.clone(), self.ctx.bulk_size);
            let mut identities = Vec::with_capacity(discovery.archives.len());
            for archive in discovery.archives {
                let identity = ArchiveIdentity::from_path(&archive).ok();
                let indexed = match &identity {
                    Some(identity) if self.ctx.skip => self.is_indexed(identity).await,
                    _ => false,
                };
                identities.extend(identity);
                if indexed {
                    tracing::info!(archive = %archive.display(), "Already indexed, skipping");
                    yield Ok(ImportEvent::Skipped(archive));
                    continue;
                }
                match step.run(&mut bulk, &archive).await {
                    Ok(release) => yield Ok(ImportEvent::Imported { archive, release: Box::new(release) }),
                    Err(error) => {
                        tracing::error!(archive = %archive.display(), error = ?error, "Import failed");
                        yield Ok(ImportEvent::Failed { archive, error });
                    },
                }
            }

            if let Err(e) = bulk.commit().await.or_raise(|| ErrorKind::Index) {
                yield Err(e);
            }
            if let Err(e) = self.index.refresh().await.or_raise(|| ErrorKind::Index) {
                yield Err(e);
                return;
            }
            tracing::debug!(documents = bulk.committed(), "Index refreshed");

            match self.purge.purge(&identities).await.or_raise(|| ErrorKind::Purge) {
                Ok(purged) => yield Ok(ImportEvent::Purged(purged)),
                Err(e) => yield Err(e),
            }

            yield Ok(ImportEvent::Complete);
        })
    }

    /// A failed lookup counts as "not indexed": importing twice is harmless.
    async fn is_indexed(&self, identity: &ArchiveIdentity) -> bool {
        let filter = ReleaseFilter::new().archive(&identity.filename).author(&identity.author);
        match self.index.count_releases(&filter).await {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::warn!(release = %identity, error = %e, "Could not check for an existing release");
                false
            },
        }
    }
}
