//! Importing a single archive.
//!
//! [`ArchiveImport`] takes one archive from extraction to its final release
//! document. The release document is saved after every change (so the last
//! write wins) while file documents are queued on a shared [`BulkIndexer`].
//!
//! [`BulkIndexer`]: relidx_index::BulkIndexer

mod build;
pub mod error;

pub use self::build::{ArchiveImport, Traversal};
