//! Read-only search index.
//!
//! Wraps another index and prevents write operations from executing, while
//! still indicating success on return. Used for dry runs.

use async_trait::async_trait;
use relidx_model::{Document, ReleaseDocument};

use crate::{IndexHandle, ReleaseFilter, SearchIndex, error::Result};

/// Read-only search index.
///
/// Wraps another index and silently drops all write operations, logging an
/// [`info event`](tracing::Event). Queries still reach the inner index, so
/// the skip check behaves exactly as it would in a real run.
#[derive(Clone)]
pub struct ReadOnlyIndex {
    inner: IndexHandle,
}
impl ReadOnlyIndex {
    pub fn new(inner: IndexHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SearchIndex for ReadOnlyIndex {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn put(&self, document: &Document) -> Result<()> {
        tracing::info!(kind = document.kind(), id = %document.id(), "Skipping put during read-only mode");
        Ok(())
    }

    async fn bulk(&self, documents: Vec<Document>) -> Result<()> {
        tracing::info!(documents = documents.len(), "Skipping bulk commit during read-only mode");
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        tracing::info!("Skipping refresh during read-only mode");
        Ok(())
    }

    async fn count_releases(&self, filter: &ReleaseFilter) -> Result<u64> {
        self.inner.count_releases(filter).await
    }

    async fn find_releases(&self, filter: &ReleaseFilter) -> Result<Vec<ReleaseDocument>> {
        self.inner.find_releases(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryIndex;
    use relidx_model::{ArchiveIdentity, Status};
    use std::sync::Arc;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn test_writes_are_dropped_and_reads_pass_through() {
        let identity = ArchiveIdentity::parse("A/AB/ABC/Foo-1.0.tar.gz").unwrap();
        let release = ReleaseDocument::new(&identity, Status::Cpan, OffsetDateTime::UNIX_EPOCH);
        let memory = Arc::new(MemoryIndex::default());
        memory.put(&Document::from(release.clone())).await.unwrap();

        let index = ReadOnlyIndex::new(memory.clone());
        index.put(&Document::from(release)).await.unwrap();
        index.bulk(Vec::new()).await.unwrap();
        index.refresh().await.unwrap();

        assert_eq!(memory.journal().await.len(), 1);
        assert_eq!(index.count_releases(&ReleaseFilter::new().author("ABC")).await.unwrap(), 1);
    }
}
