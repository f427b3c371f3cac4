//! Search index trait and implementations.
//!
//! This module defines the `SearchIndex` trait, the interface the importer
//! writes documents through. Concrete engines live in other crates (see
//! `relidx-store`); this crate only ships decorators and an in-memory index.

#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;

#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MemoryIndex, Write};
pub use self::ro::ReadOnlyIndex;
use crate::error::Result;
use crate::filter::ReleaseFilter;
use async_trait::async_trait;
use relidx_model::{Document, ReleaseDocument};

/// Unified interface for search index backends.
///
/// # Visibility
/// - [`put()`](Self::put) is durable and visible to queries as soon as it
///   returns.
/// - [`bulk()`](Self::bulk) is durable once it returns, but documents only
///   become visible to queries after the next [`refresh()`](Self::refresh).
///
/// # Examples
///
/// ```
/// use relidx_index::{ReleaseFilter, SearchIndex, error::Result};
///
/// async fn already_indexed(index: &dyn SearchIndex, author: &str, archive: &str) -> Result<bool> {
///     let filter = ReleaseFilter::new().author(author).archive(archive);
///     Ok(index.count_releases(&filter).await? > 0)
/// }
/// ```
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Name of the backend (used for logging only).
    fn name(&self) -> &str;

    /// Insert or replace a single document, immediately visible.
    async fn put(&self, document: &Document) -> Result<()>;

    /// Insert or replace a batch of documents in one commit.
    ///
    /// Either the whole batch is committed or none of it is.
    async fn bulk(&self, documents: Vec<Document>) -> Result<()>;

    /// Make everything committed through [`bulk()`](Self::bulk) visible.
    async fn refresh(&self) -> Result<()>;

    /// Count visible release documents matching `filter`.
    ///
    /// Default implementation counts the results of
    /// [`find_releases()`](Self::find_releases).
    async fn count_releases(&self, filter: &ReleaseFilter) -> Result<u64> {
        Ok(self.find_releases(filter).await?.len() as u64)
    }

    /// Visible release documents matching `filter`, oldest first.
    async fn find_releases(&self, filter: &ReleaseFilter) -> Result<Vec<ReleaseDocument>>;
}
