//! Event browsing backed by a client-side query cache.
//!
//! - `query`: keyed cache with fetch deduplication, stale-while-revalidate,
//!   prefix invalidation and retention of unobserved entries
//! - `api`: the events REST backend behind the `EventTransport` trait
//! - `events`: the keys, loaders and mutation policies of the event views
//! - `cache`: on-disk snapshots of the query cache
//! - `config`: file and environment configuration

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod query;

pub use api::{ApiClient, EventListParams, EventTransport, TransportError};
pub use config::Config;
pub use error::QueryError;
pub use events::EventQueries;
pub use models::{Event, EventDraft, EventImage};
pub use query::{QueryClient, QueryKey, QueryOptions, QueryState, QueryStatus};
