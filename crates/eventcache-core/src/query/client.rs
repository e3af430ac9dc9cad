//! Fetch coordination and invalidation over a shared [`EntryStore`].
//!
//! `QueryClient` is cheap to clone; every clone talks to the same store.
//! Fetches run as spawned tokio tasks so a result still lands in the cache
//! after every caller has stopped waiting for it. Each fetch carries a
//! sequence number from a store-wide counter and only the newest sequence of
//! a key may write its result.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use futures::future::{self, FutureExt};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::entry::{CacheEntry, QueryState, QueryStatus};
use super::key::QueryKey;
use super::store::{EntryStore, Fetcher, InFlight, Notification, SharedFetch, Slot};
use crate::api::TransportError;
use crate::cache::DehydratedQuery;
use crate::error::QueryError;

/// Cached data is considered stale immediately unless a query says otherwise.
pub const DEFAULT_STALE_TIME: Duration = Duration::ZERO;

/// Unobserved entries are kept for 5 minutes before eviction.
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefaults {
    pub stale_time: Duration,
    pub gc_time: Duration,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Falls back to [`QueryDefaults::stale_time`] when unset.
    pub stale_time: Option<Duration>,
    pub enabled: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: None,
            enabled: true,
        }
    }
}

impl QueryOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Which invalidated entries are refetched right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefetchType {
    /// Entries with at least one subscriber.
    #[default]
    Active,
    /// Entries nobody is observing.
    Inactive,
    All,
    /// Mark stale only; the next query refetches.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvalidateOptions {
    pub refetch_type: RefetchType,
    /// Only the key itself, not the keys it covers.
    pub exact: bool,
}

impl InvalidateOptions {
    pub fn refetch(refetch_type: RefetchType) -> Self {
        Self {
            refetch_type,
            exact: false,
        }
    }

    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }
}

struct Inner {
    store: Mutex<EntryStore>,
    defaults: QueryDefaults,
}

#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

/// Keeps an observer registered; dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    inner: Weak<Inner>,
    key: QueryKey,
    id: u64,
}

impl Subscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            QueryClient { inner }.unsubscribe(&self.key, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}

fn erase_fetch<T, F, Fut>(fetch: F) -> Fetcher
where
    T: Serialize + Send + 'static,
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
{
    Arc::new(move |signal| {
        let pending = fetch(signal);
        async move {
            let data = pending.await?;
            serde_json::to_value(data).map_err(|e| {
                QueryError::CacheConsistency(format!("fetched data is not serializable: {}", e))
            })
        }
        .boxed()
    })
}

/// Report an entry that breaks the status/data/error pairing.
fn check_entry(key: &QueryKey, entry: &CacheEntry) {
    if let Err(e) = entry.check_invariants() {
        warn!(%key, error = %e, "Cache entry is inconsistent");
    }
}

fn decode<T: DeserializeOwned>(key: &QueryKey, entry: &CacheEntry) -> Result<T, QueryError> {
    match (entry.status, &entry.data, &entry.error) {
        (QueryStatus::Success, Some(data), _) => serde_json::from_value(data.clone()).map_err(|e| {
            QueryError::CacheConsistency(format!("cached data for {} has the wrong shape: {}", key, e))
        }),
        (QueryStatus::Error, _, Some(error)) => Err(error.clone()),
        (status, _, _) => Err(QueryError::CacheConsistency(format!(
            "fetch for {} settled with status {}",
            key, status
        ))),
    }
}

impl QueryClient {
    pub fn new(defaults: QueryDefaults) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(EntryStore::new()),
                defaults,
            }),
        }
    }

    pub fn defaults(&self) -> QueryDefaults {
        self.inner.defaults
    }

    // ===== Reads =====

    pub fn get_entry(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.inner.store.lock().get(key).cloned()
    }

    pub fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let data = self.inner.store.lock().get(key)?.data.clone()?;
        match serde_json::from_value(data) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(%key, error = %e, "Cached data has an unexpected shape");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.lock().is_empty()
    }

    /// Number of keys with a fetch in flight, across the whole cache.
    pub fn fetching_count(&self) -> usize {
        self.inner
            .store
            .lock()
            .slots()
            .filter(|(_, slot)| slot.in_flight.is_some())
            .count()
    }

    // ===== Subscriptions =====

    pub fn subscribe<F>(&self, key: &QueryKey, observer: F) -> Subscription
    where
        F: Fn(&QueryKey, &CacheEntry) + Send + Sync + 'static,
    {
        let id = self.inner.store.lock().add_observer(
            key,
            Arc::new(observer),
            CacheEntry::new(self.inner.defaults.stale_time),
        );
        trace!(%key, id, "Observer subscribed");
        Subscription {
            inner: Arc::downgrade(&self.inner),
            key: key.clone(),
            id,
        }
    }

    fn unsubscribe(&self, key: &QueryKey, id: u64) {
        let mut store = self.inner.store.lock();
        if store.remove_observer(key, id) == Some(0) {
            trace!(%key, "Last observer left");
            if let Some(slot) = store.slot_mut(key) {
                self.schedule_gc(key, slot);
            }
        }
    }

    /// Subscribe and run the query, the equivalent of mounting a view.
    pub async fn observe<T, F, Fut, O>(
        &self,
        key: &QueryKey,
        fetch: F,
        options: QueryOptions,
        observer: O,
    ) -> (Subscription, QueryState<T>)
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
        O: Fn(&QueryKey, &CacheEntry) + Send + Sync + 'static,
    {
        let subscription = self.subscribe(key, observer);
        let state = self.query(key, fetch, options).await;
        (subscription, state)
    }

    // ===== Fetch coordination =====

    /// Resolve a query: reuse fresh data, join a running fetch, or start one.
    ///
    /// Errors are reported through the returned state, never as `Err`.
    pub async fn query<T, F, Fut>(&self, key: &QueryKey, fetch: F, options: QueryOptions) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let fetcher = erase_fetch(fetch);
        let stale_time = options.stale_time.unwrap_or(self.inner.defaults.stale_time);

        let (done, notification) = {
            let mut store = self.inner.store.lock();
            let slot = store.slot_or_insert(key, CacheEntry::new(stale_time));
            slot.fetcher = Some(fetcher);
            slot.entry.stale_time = stale_time;
            slot.enabled = options.enabled;

            if !options.enabled {
                trace!(%key, "Query disabled, not fetching");
                if slot.entry.subscriber_count == 0 && slot.gc_at.is_none() && slot.in_flight.is_none() {
                    self.schedule_gc(key, slot);
                }
                let mut state = QueryState::from_entry(&slot.entry);
                state.status = QueryStatus::Idle;
                state.error = None;
                state.is_fetching = false;
                return state;
            }

            if slot.entry.is_fresh(Instant::now()) {
                debug!(%key, "Serving fresh cached data");
                return QueryState::from_entry(&slot.entry);
            }

            let running = slot.in_flight.as_ref().map(|f| f.done.clone());
            match running {
                Some(done) => {
                    debug!(%key, "Joining in-flight fetch");
                    (done, None)
                }
                None => match self.start_fetch(&mut store, key) {
                    Some((done, notification)) => (done, Some(notification)),
                    None => {
                        return store
                            .get(key)
                            .map(QueryState::from_entry)
                            .unwrap_or_default()
                    }
                },
            }
        };

        if let Some(notification) = notification {
            notification.dispatch();
        }
        self.settle(key, done).await;

        self.get_entry(key)
            .map(|entry| QueryState::from_entry(&entry))
            .unwrap_or_default()
    }

    /// Blocking prefetch for route loaders: returns cached data when fresh,
    /// otherwise waits for a fetch and returns its outcome.
    pub async fn fetch_query<T, F, Fut>(
        &self,
        key: &QueryKey,
        fetch: F,
        options: QueryOptions,
    ) -> Result<T, QueryError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let fetcher = erase_fetch(fetch);
        let stale_time = options.stale_time.unwrap_or(self.inner.defaults.stale_time);

        let (done, notification) = {
            let mut store = self.inner.store.lock();
            let slot = store.slot_or_insert(key, CacheEntry::new(stale_time));
            slot.fetcher = Some(fetcher);
            slot.entry.stale_time = stale_time;

            if slot.entry.is_fresh(Instant::now()) {
                debug!(%key, "Prefetch satisfied from cache");
                return decode(key, &slot.entry);
            }

            let running = slot.in_flight.as_ref().map(|f| f.done.clone());
            match running {
                Some(done) => (done, None),
                None => {
                    let (done, notification) = self.start_fetch(&mut store, key).ok_or_else(|| {
                        QueryError::CacheConsistency(format!("could not start a fetch for {}", key))
                    })?;
                    (done, Some(notification))
                }
            }
        };

        if let Some(notification) = notification {
            notification.dispatch();
        }
        self.settle(key, done).await;

        let entry = self.get_entry(key).ok_or_else(|| {
            QueryError::CacheConsistency(format!("{} was evicted while fetching", key))
        })?;
        decode(key, &entry)
    }

    /// Force a new fetch with the last registered fetch function, superseding
    /// any fetch already running for the key.
    pub async fn refetch(&self, key: &QueryKey) -> Result<CacheEntry, QueryError> {
        let (done, notification) = {
            let mut store = self.inner.store.lock();
            if store.slot(key).and_then(|slot| slot.fetcher.as_ref()).is_none() {
                return Err(QueryError::CacheConsistency(format!(
                    "no fetch function registered for {}",
                    key
                )));
            }
            self.start_fetch(&mut store, key).ok_or_else(|| {
                QueryError::CacheConsistency(format!("could not start a fetch for {}", key))
            })?
        };

        notification.dispatch();
        self.settle(key, done).await;

        self.get_entry(key).ok_or_else(|| {
            QueryError::CacheConsistency(format!("{} was evicted while fetching", key))
        })
    }

    /// Wait for `done`, then for every fetch that superseded it while we were
    /// waiting, so the entry read afterwards has settled.
    async fn settle(&self, key: &QueryKey, mut done: SharedFetch) {
        loop {
            done.clone().await;
            let next = self
                .inner
                .store
                .lock()
                .slot(key)
                .and_then(|slot| slot.in_flight.as_ref().map(|f| f.done.clone()));
            match next {
                Some(next) if !next.ptr_eq(&done) => {
                    trace!(%key, "Fetch was superseded, waiting for the newer one");
                    done = next;
                }
                _ => break,
            }
        }
    }

    /// Launch a fetch for `key`. The caller holds the store lock and must
    /// dispatch the returned notification after releasing it.
    fn start_fetch(&self, store: &mut EntryStore, key: &QueryKey) -> Option<(SharedFetch, Notification)> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(%key, "No async runtime available, fetch not started");
                return None;
            }
        };

        let seq = store.next_fetch_seq();
        let slot = store.slot_mut(key)?;
        let fetcher = slot.fetcher.clone()?;

        if let Some(previous) = slot.in_flight.take() {
            debug!(%key, superseded = previous.seq, "Cancelling superseded fetch");
            previous.signal.cancel();
        }

        slot.fetch_seq = seq;
        let signal = CancellationToken::new();

        slot.entry.is_fetching = true;
        if slot.entry.data.is_none() {
            slot.entry.status = QueryStatus::Pending;
            slot.entry.error = None;
        }

        let task = fetcher(signal.clone());
        let weak = Arc::downgrade(&self.inner);
        let task_key = key.clone();
        let handle = runtime.spawn(async move {
            let result = match AssertUnwindSafe(task).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(QueryError::CacheConsistency("fetch function panicked".into())),
            };
            if let Some(inner) = weak.upgrade() {
                QueryClient { inner }.complete_fetch(&task_key, seq, result);
            }
        });

        let done: SharedFetch = async move {
            if let Err(e) = handle.await {
                warn!(error = %e, "Fetch task did not complete");
            }
        }
        .boxed()
        .shared();

        slot.in_flight = Some(InFlight {
            seq,
            signal,
            done: done.clone(),
        });
        debug!(%key, seq, "Fetch started");

        Some((done, store.notification(key)))
    }

    fn complete_fetch(&self, key: &QueryKey, seq: u64, result: Result<Value, QueryError>) {
        let notification = {
            let mut store = self.inner.store.lock();
            let Some(slot) = store.slot_mut(key) else {
                debug!(%key, seq, "Entry removed before fetch resolved, discarding result");
                return;
            };
            if slot.fetch_seq != seq {
                debug!(%key, seq, current = slot.fetch_seq, "Discarding out-of-date fetch result");
                return;
            }

            slot.in_flight = None;
            slot.entry.is_fetching = false;
            match result {
                Ok(data) => {
                    debug!(%key, seq, "Fetch succeeded");
                    slot.entry.status = QueryStatus::Success;
                    slot.entry.data = Some(data);
                    slot.entry.error = None;
                    slot.entry.last_fetched_at = Some(Instant::now());
                    slot.entry.updated_at = Some(Utc::now());
                    slot.entry.is_invalidated = false;
                }
                Err(error) => {
                    warn!(%key, seq, error = %error, "Fetch failed");
                    slot.entry.status = QueryStatus::Error;
                    slot.entry.error = Some(error);
                }
            }
            check_entry(key, &slot.entry);

            if slot.entry.subscriber_count == 0 {
                self.schedule_gc(key, slot);
            }
            store.notification(key)
        };
        notification.dispatch();
    }

    // ===== Direct writes =====

    /// Seed or overwrite cached data, e.g. from a route loader.
    pub fn set_query_data<T: Serialize>(&self, key: &QueryKey, data: T) -> Result<(), QueryError> {
        let value = serde_json::to_value(data).map_err(|e| {
            QueryError::CacheConsistency(format!("data for {} is not serializable: {}", key, e))
        })?;

        let notification = {
            let mut store = self.inner.store.lock();
            let slot = store.slot_or_insert(key, CacheEntry::new(self.inner.defaults.stale_time));
            slot.entry.status = QueryStatus::Success;
            slot.entry.data = Some(value);
            slot.entry.error = None;
            slot.entry.last_fetched_at = Some(Instant::now());
            slot.entry.updated_at = Some(Utc::now());
            slot.entry.is_invalidated = false;
            check_entry(key, &slot.entry);
            if slot.entry.subscriber_count == 0 {
                self.schedule_gc(key, slot);
            }
            store.notification(key)
        };
        notification.dispatch();
        Ok(())
    }

    // ===== Invalidation =====

    /// Mark every entry covered by `prefix` stale and refetch according to
    /// `options.refetch_type`. Returns the number of matched entries.
    pub fn invalidate(&self, prefix: &QueryKey, options: InvalidateOptions) -> usize {
        self.invalidate_inner(prefix, options).0
    }

    /// Like [`QueryClient::invalidate`], then wait for the refetches it started.
    pub async fn invalidate_and_wait(&self, prefix: &QueryKey, options: InvalidateOptions) -> usize {
        let (matched, refetches) = self.invalidate_inner(prefix, options);
        future::join_all(refetches).await;
        matched
    }

    fn invalidate_inner(&self, prefix: &QueryKey, options: InvalidateOptions) -> (usize, Vec<SharedFetch>) {
        let mut notifications = Vec::new();
        let mut refetches = Vec::new();

        let matched = {
            let mut store = self.inner.store.lock();
            let keys: Vec<QueryKey> = if options.exact {
                store.get(prefix).map(|_| vec![prefix.clone()]).unwrap_or_default()
            } else {
                store.find_by_prefix(prefix)
            };

            for key in &keys {
                let Some(slot) = store.slot_mut(key) else {
                    continue;
                };
                slot.entry.is_invalidated = true;
                let observed = slot.entry.subscriber_count > 0;
                let refetch = slot.enabled
                    && match options.refetch_type {
                        RefetchType::Active => observed,
                        RefetchType::Inactive => !observed,
                        RefetchType::All => true,
                        RefetchType::None => false,
                    };

                if refetch {
                    if let Some((done, notification)) = self.start_fetch(&mut store, key) {
                        refetches.push(done);
                        notifications.push(notification);
                        continue;
                    }
                }
                notifications.push(store.notification(key));
            }
            keys.len()
        };

        debug!(
            %prefix,
            matched,
            refetching = refetches.len(),
            refetch_type = ?options.refetch_type,
            "Invalidated queries"
        );
        for notification in notifications {
            notification.dispatch();
        }
        (matched, refetches)
    }

    /// Abort running fetches under `prefix`. Their late results are discarded
    /// and the entries fall back to their previous state.
    pub fn cancel_queries(&self, prefix: &QueryKey) -> usize {
        let mut notifications = Vec::new();
        {
            let mut store = self.inner.store.lock();
            for key in store.find_by_prefix(prefix) {
                let seq = store.next_fetch_seq();
                let Some(slot) = store.slot_mut(&key) else {
                    continue;
                };
                let Some(in_flight) = slot.in_flight.take() else {
                    continue;
                };
                in_flight.signal.cancel();
                slot.fetch_seq = seq;
                slot.entry.is_fetching = false;
                if slot.entry.status == QueryStatus::Pending {
                    slot.entry.status = QueryStatus::Idle;
                }
                if slot.entry.subscriber_count == 0 {
                    self.schedule_gc(&key, slot);
                }
                debug!(key = %key, seq = in_flight.seq, "Fetch cancelled");
                notifications.push(store.notification(&key));
            }
        }
        let cancelled = notifications.len();
        for notification in notifications {
            notification.dispatch();
        }
        cancelled
    }

    /// Drop every entry under `prefix` regardless of observers.
    pub fn remove_queries(&self, prefix: &QueryKey) -> usize {
        let mut store = self.inner.store.lock();
        let keys = store.find_by_prefix(prefix);
        for key in &keys {
            store.remove(key);
        }
        debug!(%prefix, removed = keys.len(), "Removed queries");
        keys.len()
    }

    // ===== Garbage collection =====

    fn schedule_gc(&self, key: &QueryKey, slot: &mut Slot) {
        let Some(at) = Instant::now().checked_add(self.inner.defaults.gc_time) else {
            slot.gc_at = None;
            return;
        };
        slot.gc_at = Some(at);

        // Without a runtime, eviction waits for an explicit collect_garbage().
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let key = key.clone();
        runtime.spawn(async move {
            tokio::time::sleep_until(at).await;
            if let Some(inner) = weak.upgrade() {
                QueryClient { inner }.evict_if_expired(&key);
            }
        });
    }

    fn is_collectable(slot: &Slot, now: Instant) -> bool {
        slot.entry.subscriber_count == 0
            && slot.in_flight.is_none()
            && slot.gc_at.is_some_and(|at| now >= at)
    }

    fn evict_if_expired(&self, key: &QueryKey) -> bool {
        let mut store = self.inner.store.lock();
        let now = Instant::now();
        let expired = store
            .slot(key)
            .is_some_and(|slot| Self::is_collectable(slot, now));
        if expired {
            store.remove(key);
            debug!(%key, "Evicted unobserved entry");
        }
        expired
    }

    /// Evict every unobserved entry whose retention window has passed.
    pub fn collect_garbage(&self) -> usize {
        let mut store = self.inner.store.lock();
        let now = Instant::now();
        let expired: Vec<QueryKey> = store
            .slots()
            .filter(|(_, slot)| Self::is_collectable(slot, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            store.remove(key);
        }
        if !expired.is_empty() {
            debug!(evicted = expired.len(), "Collected unobserved entries");
        }
        expired.len()
    }

    // ===== Snapshots =====

    /// Successful entries, ready to be written to disk.
    pub fn dehydrate(&self) -> Vec<DehydratedQuery> {
        let store = self.inner.store.lock();
        store
            .slots()
            .filter(|(_, slot)| slot.entry.status == QueryStatus::Success)
            .filter_map(|(key, slot)| {
                Some(DehydratedQuery {
                    key: key.clone(),
                    data: slot.entry.data.clone()?,
                    updated_at: slot.entry.updated_at.unwrap_or_else(Utc::now),
                })
            })
            .collect()
    }

    /// Load persisted entries. They are visible immediately but stale, so the
    /// first query of each key refetches in the background of the shown data.
    pub fn hydrate(&self, queries: Vec<DehydratedQuery>) -> usize {
        let mut notifications = Vec::new();
        {
            let mut store = self.inner.store.lock();
            for query in queries {
                let slot = store.slot_or_insert(&query.key, CacheEntry::new(self.inner.defaults.stale_time));
                let newer_in_cache = slot.entry.data.is_some()
                    && slot.entry.updated_at.is_some_and(|at| at >= query.updated_at);
                if newer_in_cache {
                    continue;
                }
                slot.entry.status = QueryStatus::Success;
                slot.entry.data = Some(query.data);
                slot.entry.error = None;
                slot.entry.updated_at = Some(query.updated_at);
                slot.entry.last_fetched_at = None;
                check_entry(&query.key, &slot.entry);
                if slot.entry.subscriber_count == 0 {
                    self.schedule_gc(&query.key, slot);
                }
                notifications.push(store.notification(&query.key));
            }
        }
        let hydrated = notifications.len();
        for notification in notifications {
            notification.dispatch();
        }
        debug!(hydrated, "Hydrated cache from snapshot");
        hydrated
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryDefaults::default())
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("defaults", &self.inner.defaults)
            .field("entries", &self.len())
            .finish()
    }
}
