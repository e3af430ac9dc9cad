//! In-memory entry store shared by every observer of the cache.
//!
//! The store itself is synchronous and unlocked; `QueryClient` owns it behind
//! a mutex. Mutations produce a [`Notification`] that the caller dispatches
//! once the lock is released, so observers always receive a whole snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::entry::CacheEntry;
use super::key::QueryKey;
use crate::error::QueryError;

/// Callback invoked with the new state of an entry after each update.
pub type Observer = Arc<dyn Fn(&QueryKey, &CacheEntry) + Send + Sync>;

/// Type-erased fetch function remembered per key so invalidation can refetch.
pub(crate) type Fetcher =
    Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<Value, QueryError>> + Send + Sync>;

/// Completion handle of a running fetch; every waiter clones it.
pub(crate) type SharedFetch = Shared<BoxFuture<'static, ()>>;

pub(crate) struct InFlight {
    pub(crate) seq: u64,
    pub(crate) signal: CancellationToken,
    pub(crate) done: SharedFetch,
}

pub(crate) struct Slot {
    pub(crate) entry: CacheEntry,
    observers: Vec<(u64, Observer)>,
    /// Sequence of the fetch allowed to write this entry.
    pub(crate) fetch_seq: u64,
    pub(crate) in_flight: Option<InFlight>,
    pub(crate) fetcher: Option<Fetcher>,
    pub(crate) enabled: bool,
    /// Earliest instant at which an unobserved entry may be evicted.
    pub(crate) gc_at: Option<Instant>,
}

impl Slot {
    fn new(entry: CacheEntry) -> Self {
        Self {
            entry,
            observers: Vec::new(),
            fetch_seq: 0,
            in_flight: None,
            fetcher: None,
            enabled: true,
            gc_at: None,
        }
    }
}

/// Pending observer fan-out for one entry update.
#[must_use = "notifications must be dispatched for observers to see the update"]
pub struct Notification {
    key: QueryKey,
    entry: CacheEntry,
    observers: Vec<Observer>,
}

impl Notification {
    pub fn dispatch(self) {
        for observer in &self.observers {
            observer(&self.key, &self.entry);
        }
    }
}

#[derive(Default)]
pub struct EntryStore {
    slots: HashMap<QueryKey, Slot>,
    next_observer_id: u64,
    /// Store-wide, so a slot recreated after removal never reuses the
    /// sequence of a fetch started for the removed one.
    next_fetch_seq: u64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.slots.get(key).map(|slot| &slot.entry)
    }

    /// Replace the entry for `key`, keeping its observers and fetch state.
    pub fn put(&mut self, key: &QueryKey, entry: CacheEntry) -> Notification {
        match self.slots.get_mut(key) {
            Some(slot) => {
                let subscriber_count = slot.entry.subscriber_count;
                slot.entry = entry;
                slot.entry.subscriber_count = subscriber_count;
            }
            None => {
                let mut entry = entry;
                entry.subscriber_count = 0;
                self.slots.insert(key.clone(), Slot::new(entry));
            }
        }
        self.notification(key)
    }

    /// Drop an entry. A fetch still running for it will find no slot and its
    /// result is discarded.
    pub fn remove(&mut self, key: &QueryKey) -> Option<CacheEntry> {
        self.slots.remove(key).map(|slot| {
            if let Some(in_flight) = slot.in_flight {
                in_flight.signal.cancel();
            }
            slot.entry
        })
    }

    pub fn find_by_prefix(&self, prefix: &QueryKey) -> Vec<QueryKey> {
        self.slots
            .keys()
            .filter(|key| prefix.covers(key))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &QueryKey> {
        self.slots.keys()
    }

    /// Register an observer and bump the subscriber count. Returns the id to
    /// pass to [`EntryStore::remove_observer`].
    pub fn add_observer(&mut self, key: &QueryKey, observer: Observer, entry: CacheEntry) -> u64 {
        let id = self.next_observer_id;
        self.next_observer_id += 1;
        let slot = self
            .slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(entry));
        slot.observers.push((id, observer));
        slot.entry.subscriber_count = slot.observers.len();
        slot.gc_at = None;
        id
    }

    /// Returns the remaining subscriber count, or `None` if the key is gone.
    pub fn remove_observer(&mut self, key: &QueryKey, id: u64) -> Option<usize> {
        let slot = self.slots.get_mut(key)?;
        slot.observers.retain(|(observer_id, _)| *observer_id != id);
        slot.entry.subscriber_count = slot.observers.len();
        Some(slot.entry.subscriber_count)
    }

    pub fn notification(&self, key: &QueryKey) -> Notification {
        let (entry, observers) = match self.slots.get(key) {
            Some(slot) => (
                slot.entry.clone(),
                slot.observers.iter().map(|(_, o)| Arc::clone(o)).collect(),
            ),
            None => (CacheEntry::default(), Vec::new()),
        };
        Notification {
            key: key.clone(),
            entry,
            observers,
        }
    }

    pub(crate) fn next_fetch_seq(&mut self) -> u64 {
        self.next_fetch_seq += 1;
        self.next_fetch_seq
    }

    pub(crate) fn slot(&self, key: &QueryKey) -> Option<&Slot> {
        self.slots.get(key)
    }

    pub(crate) fn slot_mut(&mut self, key: &QueryKey) -> Option<&mut Slot> {
        self.slots.get_mut(key)
    }

    pub(crate) fn slot_or_insert(&mut self, key: &QueryKey, entry: CacheEntry) -> &mut Slot {
        self.slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(entry))
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = (&QueryKey, &Slot)> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryStatus;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    fn recording_observer() -> (Observer, Arc<Mutex<Vec<QueryStatus>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: Observer = Arc::new(move |_key, entry| sink.lock().push(entry.status));
        (observer, seen)
    }

    #[test]
    fn test_put_notifies_observers_with_full_entry() {
        let mut store = EntryStore::new();
        let key = QueryKey::root("events");
        let (observer, seen) = recording_observer();
        store.add_observer(&key, observer, CacheEntry::new(Duration::ZERO));

        let mut entry = CacheEntry::new(Duration::ZERO);
        entry.status = QueryStatus::Success;
        entry.data = Some(json!([]));
        store.put(&key, entry).dispatch();

        assert_eq!(*seen.lock(), vec![QueryStatus::Success]);
        assert_eq!(store.get(&key).map(|e| e.subscriber_count), Some(1));
    }

    #[test]
    fn test_find_by_prefix() {
        let mut store = EntryStore::new();
        let events = QueryKey::root("events");
        let detail = events.join("e1").unwrap();
        let images = QueryKey::root("events-images");
        for key in [&events, &detail, &images] {
            store.put(key, CacheEntry::default()).dispatch();
        }

        let mut found = store.find_by_prefix(&events);
        found.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(found, vec![events.clone(), detail.clone()]);
        assert_eq!(store.find_by_prefix(&detail), vec![detail]);
    }

    #[test]
    fn test_remove_observer_updates_count() {
        let mut store = EntryStore::new();
        let key = QueryKey::root("events");
        let (first, _) = recording_observer();
        let (second, _) = recording_observer();
        let a = store.add_observer(&key, first, CacheEntry::default());
        let _b = store.add_observer(&key, second, CacheEntry::default());
        assert_eq!(store.get(&key).unwrap().subscriber_count, 2);
        assert_eq!(store.remove_observer(&key, a), Some(1));
        assert!(store.remove(&key).is_some());
        assert_eq!(store.remove_observer(&key, a), None);
    }

    #[test]
    fn test_fetch_seq_survives_removal() {
        let mut store = EntryStore::new();
        let key = QueryKey::root("events");
        store.put(&key, CacheEntry::default()).dispatch();
        let first = store.next_fetch_seq();
        store.remove(&key);
        store.put(&key, CacheEntry::default()).dispatch();
        assert!(store.next_fetch_seq() > first);
        assert_eq!(store.slot(&key).map(|slot| slot.fetch_seq), Some(0));
    }
}
