//! Work triggered by an import beyond writing its own documents.
//!
//! - [`LatestRecompute`]: re-evaluate which release of a distribution is the
//!   latest, once per imported archive.
//! - [`CachePurge`]: tell the CDN in front of the index what changed, once
//!   per run.

pub mod error;
mod latest;
mod purge;

pub use self::latest::{LatestRecompute, StatusLatest};
pub use self::purge::{CachePurge, NoPurge, SurrogatePurge, surrogate_keys};
