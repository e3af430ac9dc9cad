use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryStatus::Idle => write!(f, "idle"),
            QueryStatus::Pending => write!(f, "pending"),
            QueryStatus::Success => write!(f, "success"),
            QueryStatus::Error => write!(f, "error"),
        }
    }
}

/// Cached state for one query key.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    pub status: QueryStatus,
    /// Last successfully fetched value. Kept while a refetch is running and
    /// after a failed refetch.
    pub data: Option<Value>,
    pub error: Option<QueryError>,
    pub last_fetched_at: Option<Instant>,
    pub updated_at: Option<DateTime<Utc>>,
    pub stale_time: Duration,
    pub subscriber_count: usize,
    pub is_fetching: bool,
    pub is_invalidated: bool,
}

impl CacheEntry {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            ..Self::default()
        }
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        if self.is_invalidated {
            return true;
        }
        match self.last_fetched_at {
            Some(fetched) => now.saturating_duration_since(fetched) >= self.stale_time,
            None => true,
        }
    }

    /// Cached data may be served without contacting the transport.
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.status == QueryStatus::Success && !self.is_stale(now)
    }

    pub fn check_invariants(&self) -> Result<(), QueryError> {
        match self.status {
            QueryStatus::Success if self.data.is_none() => Err(QueryError::CacheConsistency(
                "entry is marked successful but holds no data".into(),
            )),
            QueryStatus::Error if self.error.is_none() => Err(QueryError::CacheConsistency(
                "entry is marked failed but holds no error".into(),
            )),
            _ => Ok(()),
        }
    }

    /// "5m ago" style rendering of the last data update.
    pub fn age_display(&self) -> String {
        match self.updated_at {
            Some(at) => crate::cache::age_display(at),
            None => "never".to_string(),
        }
    }
}

/// Typed view of a cache entry as handed to query callers.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<QueryError>,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
            is_stale: true,
            updated_at: None,
        }
    }
}

impl<T: DeserializeOwned> QueryState<T> {
    pub fn from_entry(entry: &CacheEntry) -> Self {
        let mut state = Self {
            status: entry.status,
            data: None,
            error: entry.error.clone(),
            is_fetching: entry.is_fetching,
            is_stale: entry.is_stale(Instant::now()),
            updated_at: entry.updated_at,
        };

        if let Some(value) = &entry.data {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(data) => state.data = Some(data),
                Err(e) => {
                    state.status = QueryStatus::Error;
                    state.error = Some(QueryError::CacheConsistency(format!(
                        "cached data does not match the requested type: {}",
                        e
                    )));
                }
            }
        }

        state
    }
}

impl<T> QueryState<T> {
    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    /// First load in progress: pending with a fetch actually running.
    /// A disabled query is never loading.
    pub fn is_loading(&self) -> bool {
        self.is_pending() && self.is_fetching
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}
