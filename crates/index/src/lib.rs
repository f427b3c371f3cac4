pub mod backend;
mod bulk;
pub mod error;
mod filter;

pub use crate::backend::SearchIndex;
pub use crate::bulk::{BulkIndexer, DEFAULT_BULK_SIZE};
pub use crate::filter::ReleaseFilter;
use std::sync::Arc;

pub type IndexHandle = Arc<dyn SearchIndex + Send + Sync>;
