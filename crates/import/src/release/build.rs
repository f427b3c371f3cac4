use crate::Context;
use crate::feeds::Feeds;
use crate::hooks::LatestRecompute;
use crate::model::ReleaseModel;
use crate::release::error::{ErrorKind, Result};
use exn::ResultExt;
use relidx_index::{BulkIndexer, IndexHandle, ReleaseFilter};
use relidx_model::{ArchiveIdentity, AssociatedPod, Document, FileRecord, ModuleRecord, Permissions, ReleaseDocument};
use std::path::Path;

/// What the single pass over a release's files collects.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Traversal {
    /// Indexed and authorized module names, in traversal order.
    pub provides: Vec<String>,
    /// Indexed modules the author holds no permissions for.
    pub unauthorized: Vec<ModuleRecord>,
}

/// Everything needed to import one archive.
pub struct ArchiveImport<'a> {
    pub ctx: &'a Context,
    pub index: &'a IndexHandle,
    pub model: &'a dyn ReleaseModel,
    pub feeds: &'a Feeds,
    pub latest: Option<&'a dyn LatestRecompute>,
}

impl ArchiveImport<'_> {
    /// Import `archive`, queueing its files on `bulk`. Returns the release
    /// document as last saved.
    #[tracing::instrument(skip_all, fields(archive = %archive.display()))]
    pub async fn run(&self, bulk: &mut BulkIndexer, archive: &Path) -> Result<ReleaseDocument> {
        let identity = ArchiveIdentity::from_path(archive).or_raise(|| ErrorKind::Identity)?;
        let status =
            self.feeds.detect_status(&identity.author, &identity.filename).await.or_raise(|| ErrorKind::Feed)?;
        let extracted = self.model.extract(archive, &identity, status).await.or_raise(|| ErrorKind::Model)?;
        let (mut release, mut files, meta) = (extracted.release, extracted.files, extracted.meta);
        tracing::info!(release = %identity, %status, files = files.len(), "Importing release");
        self.save(&release).await?;

        for file in &mut files {
            file.set_indexed(&meta);
        }
        let associated = associated_pod(&mut files);
        for file in &mut files {
            file.associate_pods(&associated);
        }

        let permissions = self.feeds.permissions().await;
        let permissions = (!permissions.is_empty()).then_some(permissions);
        let traversal = self.traverse(&mut release, files, permissions, bulk).await?;

        if !traversal.provides.is_empty() {
            let mut provides = traversal.provides;
            provides.sort();
            release.provides = provides;
            self.save(&release).await?;
        }
        if !traversal.unauthorized.is_empty() {
            release.authorized = false;
            self.save(&release).await?;
            let modules = traversal.unauthorized.iter().map(|m| m.name.as_str()).collect::<Vec<_>>();
            tracing::warn!(release = %release.name, author = %release.author, ?modules, "Release contains unauthorized modules");
        }

        if let Some(latest) = self.latest {
            latest.recompute(&release.distribution).await.or_raise(|| ErrorKind::Latest)?;
            self.reload_status(&mut release).await?;
        }

        let earlier = self
            .index
            .count_releases(&ReleaseFilter::new().distribution(&release.distribution).before(release.date))
            .await
            .or_raise(|| ErrorKind::Index)?;
        release.first = earlier == 0;
        self.save(&release).await?;

        if let Some(pause) = self.ctx.throttle {
            tokio::time::sleep(pause).await;
        }
        Ok(release)
    }

    /// Authorize, collect provides, drop pod-only module lists, queue every
    /// file and pick up the first abstract, all in one pass.
    async fn traverse(
        &self,
        release: &mut ReleaseDocument,
        files: Vec<FileRecord>,
        permissions: Option<&Permissions>,
        bulk: &mut BulkIndexer,
    ) -> Result<Traversal> {
        let mut traversal = Traversal::default();
        for mut file in files {
            if let Some(permissions) = permissions {
                traversal.unauthorized.extend(file.set_authorized(permissions));
            }
            traversal
                .provides
                .extend(file.modules().iter().filter(|m| m.indexed && m.authorized).map(|m| m.name.clone()));
            if file.is_pod_file() {
                file.clear_modules();
            }
            let found_abstract = release.r#abstract.is_none().then(|| file.r#abstract.clone()).flatten();
            bulk.push(file).await.or_raise(|| ErrorKind::Index)?;
            if let Some(found_abstract) = found_abstract {
                release.r#abstract = Some(found_abstract);
                self.save(release).await?;
            }
        }
        Ok(traversal)
    }

    /// The latest recompute may have rewritten this release's status.
    async fn reload_status(&self, release: &mut ReleaseDocument) -> Result<()> {
        let filter = ReleaseFilter::new().author(&release.author).archive(&release.archive);
        let stored = self.index.find_releases(&filter).await.or_raise(|| ErrorKind::Index)?;
        if let Some(stored) = stored.iter().find(|stored| stored.name == release.name) {
            release.status = stored.status;
        }
        Ok(())
    }

    async fn save(&self, release: &ReleaseDocument) -> Result<()> {
        self.index.put(&Document::from(release.clone())).await.or_raise(|| ErrorKind::Index)
    }
}

/// Group indexed files by the name they document. Each involved file's
/// cached documentation name is reset.
fn associated_pod(files: &mut [FileRecord]) -> AssociatedPod {
    let mut map = AssociatedPod::new();
    for file in files.iter_mut().filter(|file| file.indexed) {
        if let Some(name) = file.documentation().map(str::to_string) {
            map.entry(name).or_default().push(file.path.clone());
        }
        file.clear_documentation();
    }
    map
}
