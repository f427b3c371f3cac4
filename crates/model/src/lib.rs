//! Data model of the release import pipeline.
//!
//! - [`ArchiveIdentity`]: who released what, parsed from an archive path or URL.
//! - [`FileRecord`] / [`ModuleRecord`]: one per file inside an archive, and
//!   one per package declared in that file.
//! - [`ReleaseDocument`]: one per archive.
//! - [`ReleaseMetadata`]: the parts of a distribution's META file that decide
//!   what gets indexed.
//! - [`Permissions`]: module name → authors allowed to release it.
//! - [`Document`]: what actually gets written to the search index.

mod consts;
mod document;
pub mod error;
mod identity;
mod meta;
mod perms;
mod record;
mod release;

pub use crate::document::Document;
pub use crate::identity::{ArchiveIdentity, Maturity, is_archive_name};
pub use crate::meta::{NoIndex, Provided, ReleaseMetadata};
pub use crate::perms::Permissions;
pub use crate::record::{AssociatedPod, FileRecord, ModuleRecord};
pub use crate::release::{ReleaseDocument, Status};
