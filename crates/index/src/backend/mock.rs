//! In-memory search index for testing.

use crate::error::{ErrorKind, Result};
use crate::{ReleaseFilter, SearchIndex};
use async_trait::async_trait;
use relidx_model::{Document, ReleaseDocument};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// One write operation, as recorded by [`MemoryIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Put(Document),
    Bulk(Vec<Document>),
    Refresh,
}

#[derive(Default)]
struct State {
    visible: HashMap<String, Document>,
    pending: Vec<Document>,
    journal: Vec<Write>,
}

/// In-memory search index for testing.
///
/// Mirrors the visibility rules of a real engine: `put` is visible straight
/// away, `bulk` waits for `refresh`. Every write is journaled so tests can
/// assert on the exact sequence of saves.
///
/// # Examples
///
/// ```
/// use relidx_index::{ReleaseFilter, SearchIndex, backend::MemoryIndex};
/// use relidx_model::{ArchiveIdentity, Document, ReleaseDocument, Status};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let identity = ArchiveIdentity::parse("A/AB/ABC/Foo-1.0.tar.gz")?;
/// let release = ReleaseDocument::new(&identity, Status::Cpan, time::OffsetDateTime::UNIX_EPOCH);
///
/// let index = MemoryIndex::default();
/// index.put(&Document::from(release)).await?;
/// assert_eq!(index.count_releases(&ReleaseFilter::new().author("ABC")).await?, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemoryIndex {
    state: RwLock<State>,
    failing_bulk: AtomicBool,
}

impl MemoryIndex {
    /// Make every following `bulk` call fail (or succeed again).
    pub fn set_failing_bulk(&self, failing: bool) {
        self.failing_bulk.store(failing, Ordering::SeqCst);
    }

    /// Every write so far, in order.
    pub async fn journal(&self) -> Vec<Write> {
        self.state.read().await.journal.clone()
    }

    /// Release documents written through `put`, in write order.
    pub async fn release_puts(&self) -> Vec<ReleaseDocument> {
        self.state
            .read()
            .await
            .journal
            .iter()
            .filter_map(|write| match write {
                Write::Put(Document::Release(release)) => Some(release.clone()),
                _ => None,
            })
            .collect()
    }

    /// Look up a visible document by id.
    pub async fn get(&self, id: &str) -> Option<Document> {
        self.state.read().await.visible.get(id).cloned()
    }

    /// Every visible document, in no particular order.
    pub async fn documents(&self) -> Vec<Document> {
        self.state.read().await.visible.values().cloned().collect()
    }

    pub async fn pending(&self) -> usize {
        self.state.read().await.pending.len()
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, document: &Document) -> Result<()> {
        let mut state = self.state.write().await;
        state.visible.insert(document.id(), document.clone());
        state.journal.push(Write::Put(document.clone()));
        Ok(())
    }

    async fn bulk(&self, documents: Vec<Document>) -> Result<()> {
        if self.failing_bulk.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Backend("bulk rejected by memory index".to_string()));
        }
        let mut state = self.state.write().await;
        state.pending.extend(documents.iter().cloned());
        state.journal.push(Write::Bulk(documents));
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let pending = std::mem::take(&mut state.pending);
        for document in pending {
            state.visible.insert(document.id(), document);
        }
        state.journal.push(Write::Refresh);
        Ok(())
    }

    async fn find_releases(&self, filter: &ReleaseFilter) -> Result<Vec<ReleaseDocument>> {
        let mut releases: Vec<ReleaseDocument> = self
            .state
            .read()
            .await
            .visible
            .values()
            .filter_map(Document::as_release)
            .filter(|release| filter.matches(release))
            .cloned()
            .collect();
        releases.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        Ok(releases)
    }
}
