use crate::model::error::{ErrorKind, Result};
use crate::model::{Extracted, ReleaseModel};
use async_trait::async_trait;
use exn::ResultExt;
use relidx_model::{ArchiveIdentity, FileRecord, ModuleRecord, ReleaseDocument, ReleaseMetadata, Status};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

const SIDECAR_EXTENSION: &str = "meta";
/// What CPAN tooling writes when a distribution has no abstract.
const UNKNOWN_ABSTRACT: &str = "unknown";

/// [`ReleaseModel`] backed by the `<name>.meta` file mirrors keep next to
/// every archive.
///
/// The archive itself is never opened: files and packages come from the META
/// `provides` section, and the release date is the archive's modification
/// time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarModel;

impl SidecarModel {
    pub fn sidecar_path(archive: &Path, identity: &ArchiveIdentity) -> PathBuf {
        archive.with_file_name(format!("{}.{SIDECAR_EXTENSION}", identity.name))
    }
}

#[async_trait]
impl ReleaseModel for SidecarModel {
    #[tracing::instrument(level = "debug", skip_all, fields(release = %identity))]
    async fn extract(&self, archive: &Path, identity: &ArchiveIdentity, status: Status) -> Result<Extracted> {
        let modified = tokio::fs::metadata(archive)
            .await
            .and_then(|metadata| metadata.modified())
            .or_raise(|| ErrorKind::Io(archive.to_path_buf()))?;
        let sidecar = Self::sidecar_path(archive, identity);
        let bytes = match tokio::fs::read(&sidecar).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => exn::bail!(ErrorKind::MissingSidecar(sidecar)),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Io(sidecar)),
        };
        let meta = ReleaseMetadata::from_json(&bytes).or_raise(|| ErrorKind::InvalidSidecar(sidecar.clone()))?;

        let mut release = ReleaseDocument::new(identity, status, OffsetDateTime::from(modified));
        release.r#abstract = meta
            .r#abstract
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case(UNKNOWN_ABSTRACT))
            .map(str::to_string);
        let files = files(&release, &meta);
        tracing::debug!(files = files.len(), "Read metadata sidecar");
        Ok(Extracted { release, files, meta })
    }
}

/// One record per file named in `provides`, ordered by path.
fn files(release: &ReleaseDocument, meta: &ReleaseMetadata) -> Vec<FileRecord> {
    let main_module = release.distribution.replace('-', "::");
    let mut by_path: BTreeMap<&str, FileRecord> = BTreeMap::new();
    for (module, provided) in &meta.provides {
        let path = provided.file.trim_start_matches("./");
        let file = by_path.entry(path).or_insert_with(|| FileRecord::new(release, path));
        file.push_module(ModuleRecord::new(module, provided.version.clone()));
        if *module == main_module {
            file.pod_name = Some(main_module.clone());
            file.r#abstract = release.r#abstract.clone();
        }
    }
    by_path.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::release;
    use std::time::Duration;

    fn identity(archive: &Path) -> ArchiveIdentity {
        ArchiveIdentity::from_path(archive).unwrap()
    }

    #[tokio::test]
    async fn test_extract() {
        let dir = tempfile::tempdir().unwrap();
        let provides = [("Foo::Bar", "lib/Foo/Bar.pm"), ("Foo::Bar::Util", "lib/Foo/Bar.pm"), ("Foo::Baz", "./lib/Foo/Baz.pm")];
        let archive = release(dir.path(), "A/AB/ABC/Foo-Bar-1.0.tar.gz", &provides, Duration::from_secs(3600));

        let extracted = SidecarModel.extract(&archive, &identity(&archive), Status::Backpan).await.unwrap();
        assert_eq!(extracted.release.name, "Foo-Bar-1.0");
        assert_eq!(extracted.release.status, Status::Backpan);
        assert_eq!(extracted.release.r#abstract.as_deref(), Some("Foo-Bar-1.0 does things"));
        let paths = extracted.files.iter().map(|f| f.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, ["lib/Foo/Bar.pm", "lib/Foo/Baz.pm"]);
        let modules = extracted.files[0].modules().iter().map(|m| m.name.as_str()).collect::<Vec<_>>();
        assert_eq!(modules, ["Foo::Bar", "Foo::Bar::Util"]);
        assert_eq!(extracted.files[0].r#abstract, extracted.release.r#abstract);
        assert_eq!(extracted.files[1].r#abstract, None);
    }

    #[tokio::test]
    async fn test_release_date_is_archive_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let archive = release(dir.path(), "A/AB/ABC/Foo-1.0.tar.gz", &[], Duration::from_secs(86_400));
        let extracted = SidecarModel.extract(&archive, &identity(&archive), Status::Cpan).await.unwrap();
        let age = OffsetDateTime::now_utc() - extracted.release.date;
        assert!((age.whole_hours() - 24).abs() <= 1);
    }

    #[tokio::test]
    async fn test_unknown_abstract_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let archive = release(dir.path(), "A/AB/ABC/Foo-1.0.tar.gz", &[], Duration::ZERO);
        let sidecar = SidecarModel::sidecar_path(&archive, &identity(&archive));
        std::fs::write(&sidecar, r#"{"name":"Foo","abstract":"unknown","version":1.0}"#).unwrap();
        let extracted = SidecarModel.extract(&archive, &identity(&archive), Status::Cpan).await.unwrap();
        assert_eq!(extracted.release.r#abstract, None);
        assert!(extracted.files.is_empty());
    }

    #[tokio::test]
    async fn test_sidecar_errors() {
        let dir = tempfile::tempdir().unwrap();
        let archive = release(dir.path(), "A/AB/ABC/Foo-1.0.tar.gz", &[], Duration::ZERO);
        let sidecar = SidecarModel::sidecar_path(&archive, &identity(&archive));

        std::fs::write(&sidecar, "not json").unwrap();
        let err = SidecarModel.extract(&archive, &identity(&archive), Status::Cpan).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidSidecar(_)));

        std::fs::remove_file(&sidecar).unwrap();
        let err = SidecarModel.extract(&archive, &identity(&archive), Status::Cpan).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingSidecar(_)));
    }
}
