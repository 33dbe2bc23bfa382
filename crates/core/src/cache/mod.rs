//! Persistent query-to-root cache.
//!
//! Maps normalized queries to the root status ids found for them. The map
//! lives in memory behind a reader-writer lock and is mirrored to a single
//! JSON file:
//!
//! - Empty root lists are cached too, so unmatched queries are not re-searched
//! - Writes are atomic (temp file plus rename); the old file survives a crash
//! - Load and write failures are logged, never fatal

mod persist;
pub mod query;
pub mod store;

pub use query::{normalize_query, strip_marker};
pub use store::RootCache;
