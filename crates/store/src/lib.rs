//! SQLite-backed search index.
//!
//! Every document is stored as its JSON body next to a handful of
//! denormalized columns used to filter releases. Bulk commits land in a
//! `pending` table and only become visible once the index is refreshed,
//! which mirrors how a real search engine behaves.

mod db;
pub mod error;
mod index;
mod models;

pub use crate::db::Database;
pub use crate::index::SqliteIndex;
