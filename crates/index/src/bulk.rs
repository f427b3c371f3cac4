use crate::IndexHandle;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use relidx_model::Document;

/// Default number of documents per commit.
pub const DEFAULT_BULK_SIZE: usize = 10;

/// Queues documents and commits them in batches.
///
/// A batch is committed as soon as the queue reaches `size`. Whatever is left
/// must be flushed with [`commit()`](Self::commit). A failed commit is not
/// retried: the drained documents are gone and the error is returned.
pub struct BulkIndexer {
    index: IndexHandle,
    size: usize,
    queue: Vec<Document>,
    committed: usize,
}

impl BulkIndexer {
    pub fn new(index: IndexHandle, size: usize) -> Self {
        let size = size.max(1);
        Self { index, size, queue: Vec::with_capacity(size), committed: 0 }
    }

    pub async fn push(&mut self, document: impl Into<Document>) -> Result<()> {
        self.queue.push(document.into());
        if self.queue.len() >= self.size {
            self.commit().await?;
        }
        Ok(())
    }

    /// Commit everything queued. Returns the number of documents committed.
    #[tracing::instrument(level = "debug", skip(self), fields(index = self.index.name(), queued = self.queue.len()))]
    pub async fn commit(&mut self) -> Result<usize> {
        if self.queue.is_empty() {
            return Ok(0);
        }
        let batch = std::mem::replace(&mut self.queue, Vec::with_capacity(self.size));
        let count = batch.len();
        self.index.bulk(batch).await.or_raise(|| ErrorKind::Bulk(count))?;
        self.committed += count;
        tracing::debug!(count, total = self.committed, "Committed bulk batch");
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Documents committed over the lifetime of this indexer.
    pub fn committed(&self) -> usize {
        self.committed
    }
}
