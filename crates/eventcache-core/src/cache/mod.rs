//! On-disk snapshots of the query cache.
//!
//! Successful entries are dehydrated to `queries.json` in the cache directory
//! and hydrated back on start-up, so previously seen events show up
//! immediately (as stale data) while fresh copies are fetched. Snapshots
//! older than a day are ignored.

pub mod snapshot;

pub use snapshot::{age_display, CachedData, DehydratedQuery, SnapshotStore};
