//! Client-side query cache.
//!
//! - [`QueryKey`]: canonical, prefix-ordered cache keys
//! - [`EntryStore`]: one [`CacheEntry`] per key plus its observers
//! - [`QueryClient`]: fetch deduplication, staleness, invalidation, eviction
//! - [`Mutation`]: write operations with success/error policies

pub mod client;
pub mod entry;
pub mod key;
pub mod mutation;
pub mod store;

pub use client::{
    InvalidateOptions, QueryClient, QueryDefaults, QueryOptions, RefetchType, Subscription,
    DEFAULT_GC_TIME, DEFAULT_STALE_TIME,
};
pub use entry::{CacheEntry, QueryState, QueryStatus};
pub use key::QueryKey;
pub use mutation::{Mutation, MutationRecord, MutationStatus};
pub use store::{EntryStore, Notification, Observer};

/// Re-exported so fetch functions can name the abort signal they receive.
pub use tokio_util::sync::CancellationToken as AbortSignal;
