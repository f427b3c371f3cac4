//! Turning an archive into documents.
//!
//! A [`ReleaseModel`] knows how to look inside an archive. The importer only
//! needs the release document, the files with their declared packages and
//! the distribution's META data; everything else about the archive format
//! stays behind this trait.

pub mod error;
mod sidecar;

pub use self::sidecar::SidecarModel;
use crate::model::error::Result;
use async_trait::async_trait;
use relidx_model::{ArchiveIdentity, FileRecord, ReleaseDocument, ReleaseMetadata, Status};
use std::path::Path;

/// Everything extracted from one archive, before indexing rules are applied.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub release: ReleaseDocument,
    /// Files in archive order.
    pub files: Vec<FileRecord>,
    pub meta: ReleaseMetadata,
}

#[async_trait]
pub trait ReleaseModel: Send + Sync {
    /// Read `archive` into a release document (with the given `status`) and
    /// its files.
    async fn extract(&self, archive: &Path, identity: &ArchiveIdentity, status: Status) -> Result<Extracted>;
}
