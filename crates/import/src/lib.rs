//! Release import pipeline.
//!
//! Takes archives (directories to search, files, or URLs to fetch), turns
//! each one into a release document and file documents, and writes them to a
//! [`SearchIndex`](relidx_index::SearchIndex). The entry point is
//! [`Importer::run`], which streams an [`ImportEvent`] per step.
//!
//! - [`locate`]: inputs to local archive paths.
//! - [`feeds`]: permissions and backpan listings from the mirror.
//! - [`model`]: reading an archive into documents.
//! - [`release`]: the per-archive pipeline.
//! - [`hooks`]: latest-release recompute and cache purging.

mod context;
pub mod error;
pub mod feeds;
pub mod hooks;
pub mod locate;
pub mod model;
pub mod release;
mod stream;
#[cfg(test)]
mod testing;

pub use crate::context::Context;
pub use crate::feeds::Feeds;
pub use crate::hooks::{CachePurge, LatestRecompute, NoPurge, StatusLatest, SurrogatePurge};
pub use crate::locate::{Discovery, Fetched, HttpMirror, Mirror};
pub use crate::model::{Extracted, ReleaseModel, SidecarModel};
pub use crate::stream::{ImportEvent, Importer};
