use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::query::QueryKey;

/// Snapshot file name inside the cache directory
const SNAPSHOT_FILE: &str = "queries";

/// Snapshots older than a day are ignored on load.
/// Event data changes often enough that older copies mislead more than help.
const SNAPSHOT_MAX_AGE_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        age_display(self.cached_at)
    }

    pub fn is_expired(&self) -> bool {
        self.age_minutes() > SNAPSHOT_MAX_AGE_MINUTES
    }
}

/// Human readable age: "just now", "12m ago", "3h ago", "2d ago".
pub fn age_display(at: DateTime<Utc>) -> String {
    let minutes = (Utc::now() - at).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        let remaining_mins = minutes % 60;
        if remaining_mins >= 30 {
            // Round up: 1h 30m+ becomes 2h
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        let remaining_hours = (minutes % 1440) / 60;
        if remaining_hours >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// A successful cache entry in its persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DehydratedQuery {
    pub key: QueryKey,
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}

/// Stores dehydrated cache snapshots as JSON files.
pub struct SnapshotStore {
    cache_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        Ok(())
    }

    /// Load the last snapshot, ignoring one that has expired.
    pub fn load_queries(&self) -> Result<Option<CachedData<Vec<DehydratedQuery>>>> {
        match self.load::<Vec<DehydratedQuery>>(SNAPSHOT_FILE)? {
            Some(cached) if cached.is_expired() => {
                debug!(age = %cached.age_display(), "Ignoring expired snapshot");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    pub fn save_queries(&self, queries: &[DehydratedQuery]) -> Result<()> {
        debug!(count = queries.len(), "Saving cache snapshot");
        self.save(SNAPSHOT_FILE, &queries)
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.cache_path(SNAPSHOT_FILE);
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove cache snapshot")?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_age_display_rounding() {
        assert_eq!(age_display(Utc::now() - Duration::minutes(5)), "5m ago");
        assert_eq!(age_display(Utc::now() - Duration::minutes(95)), "2h ago");
        assert_eq!(age_display(Utc::now() - Duration::minutes(65)), "1h ago");
        assert_eq!(age_display(Utc::now() - Duration::hours(40)), "2d ago");
    }

    #[test]
    fn test_cached_data_is_expired() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_expired());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::hours(25);
        assert!(old.is_expired());
    }

    #[test]
    fn test_save_and_load_queries() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshots")).unwrap();
        assert!(store.load_queries().unwrap().is_none());

        let query = DehydratedQuery {
            key: QueryKey::root("events").join("e1").unwrap(),
            data: json!({ "id": "e1", "title": "Hike" }),
            updated_at: Utc::now(),
        };
        store.save_queries(std::slice::from_ref(&query)).unwrap();

        let loaded = store.load_queries().unwrap().unwrap();
        assert_eq!(loaded.data, vec![query]);

        store.clear().unwrap();
        assert!(store.load_queries().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("queries.json"), "not json").unwrap();
        assert!(store.load_queries().is_err());
    }
}
