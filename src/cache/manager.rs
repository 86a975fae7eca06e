//! Time-boxed shard cache on top of a [`CacheStore`]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::store::{CacheStore, FileStore, MemoryStore};
use crate::data::Shard;
use crate::error::RaasResult;

/// Record stored for each shard
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// Milliseconds since the Unix epoch at write time
    ts: i64,
    data: T,
}

/// Returns the store key for a shard
pub fn cache_key(lang: &str, shard: u32) -> String {
    format!("raas-{}-{}", lang, shard)
}

/// Shard cache with expiry
///
/// A read of an entry older than the TTL deletes it and reports a miss. A
/// read of an entry that fails to parse does the same. Writes always replace.
#[derive(Debug, Clone)]
pub struct ShardCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ShardCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn CacheStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock, ttl }
    }

    /// In-memory cache scoped to this process
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new()), ttl)
    }

    /// Picks the persistent file store when the platform cache directory for
    /// `base_url` is usable, and the in-memory store otherwise
    pub fn detect(base_url: &str, ttl: Duration) -> Self {
        Self::detect_in(FileStore::default_dir(base_url), ttl)
    }

    /// Uses a file store in `dir` if it can be created, else an in-memory store
    pub fn detect_in(dir: Option<PathBuf>, ttl: Duration) -> Self {
        if let Some(dir) = dir {
            let file_store = FileStore::with_dir(dir);
            match file_store.ensure_dir() {
                Ok(()) => {
                    debug!(dir = %file_store.dir().display(), "using persistent shard cache");
                    return Self::new(Arc::new(file_store), ttl);
                }
                Err(e) => {
                    debug!(error = %e, "cache directory unavailable, using in-memory shard cache");
                }
            }
        }
        Self::in_memory(ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_persistent()
    }

    /// Reads a shard, or `None` if absent, expired, or unreadable
    pub fn read(&self, lang: &str, shard: u32) -> Option<Shard> {
        let key = cache_key(lang, shard);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read cache entry");
                return None;
            }
        };

        let entry: CacheEntry<Shard> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "evicting malformed cache entry");
                self.evict(&key);
                return None;
            }
        };

        let age_ms = self.clock.now().timestamp_millis() - entry.ts;
        if age_ms > self.ttl_millis() {
            debug!(key = %key, age_ms, "evicting expired cache entry");
            self.evict(&key);
            return None;
        }

        Some(entry.data)
    }

    /// Stores a shard stamped with the current time
    pub fn write(&self, lang: &str, shard: u32, data: &Shard) -> RaasResult<()> {
        let entry = CacheEntry {
            ts: self.clock.now().timestamp_millis(),
            data,
        };
        let json = serde_json::to_string(&entry)?;
        self.store.set(&cache_key(lang, shard), &json)?;
        Ok(())
    }

    /// Removes every cached shard
    pub fn clear(&self) -> RaasResult<()> {
        self.store.clear()?;
        Ok(())
    }

    fn evict(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!(key = %key, error = %e, "failed to evict cache entry");
        }
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::data::Roast;
    use chrono::{Duration as ChronoDuration, Utc};
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn sample_shard() -> Shard {
        Shard {
            language: Some("en".to_string()),
            shard: Some(1),
            roasts: vec![Roast {
                id: None,
                text: "Your code has more smells than a cheese shop.".to_string(),
                intensity: 2,
                length: 45,
            }],
        }
    }

    fn manual_cache(store: Arc<dyn CacheStore>) -> (ShardCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = ShardCache::with_clock(store, DAY, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key("en", 3), "raas-en-3");
    }

    #[test]
    fn test_read_missing_is_none() {
        let cache = ShardCache::in_memory(DAY);
        assert!(cache.read("en", 1).is_none());
        assert!(!cache.is_persistent());
    }

    #[test]
    fn test_write_then_read() {
        let cache = ShardCache::in_memory(DAY);
        cache.write("en", 1, &sample_shard()).expect("Write should succeed");

        assert_eq!(cache.read("en", 1), Some(sample_shard()));
        assert!(cache.read("en", 2).is_none());
        assert!(cache.read("bn", 1).is_none());
    }

    #[test]
    fn test_hit_just_before_ttl() {
        let store = Arc::new(MemoryStore::new());
        let (cache, clock) = manual_cache(store.clone());
        cache.write("en", 1, &sample_shard()).unwrap();

        clock.advance(ChronoDuration::hours(24) - ChronoDuration::milliseconds(1));

        assert!(cache.read("en", 1).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_exactly_ttl_is_still_fresh() {
        let (cache, clock) = manual_cache(Arc::new(MemoryStore::new()));
        cache.write("en", 1, &sample_shard()).unwrap();

        clock.advance(ChronoDuration::hours(24));

        assert!(cache.read("en", 1).is_some());
    }

    #[test]
    fn test_miss_and_evict_just_after_ttl() {
        let store = Arc::new(MemoryStore::new());
        let (cache, clock) = manual_cache(store.clone());
        cache.write("en", 1, &sample_shard()).unwrap();

        clock.advance(ChronoDuration::hours(24) + ChronoDuration::milliseconds(1));

        assert!(cache.read("en", 1).is_none());
        assert!(store.is_empty(), "Expired entry should be evicted");
    }

    #[test]
    fn test_malformed_entry_is_evicted() {
        let store = Arc::new(MemoryStore::new());
        store.set("raas-en-1", "{not json").unwrap();
        let cache = ShardCache::new(store.clone(), DAY);

        assert!(cache.read("en", 1).is_none());
        assert!(store.get("raas-en-1").unwrap().is_none());
    }

    #[test]
    fn test_write_replaces_and_restamps() {
        let (cache, clock) = manual_cache(Arc::new(MemoryStore::new()));
        cache.write("en", 1, &sample_shard()).unwrap();

        clock.advance(ChronoDuration::hours(20));
        let mut updated = sample_shard();
        updated.roasts[0].intensity = 3;
        cache.write("en", 1, &updated).unwrap();

        clock.advance(ChronoDuration::hours(20));
        assert_eq!(cache.read("en", 1), Some(updated));
    }

    #[test]
    fn test_entry_format_in_file_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(FileStore::with_dir(temp_dir.path().to_path_buf()));
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = ShardCache::with_clock(store, DAY, clock.clone());

        cache.write("bn", 2, &sample_shard()).unwrap();

        let content = std::fs::read_to_string(temp_dir.path().join("raas-bn-2.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["ts"], clock.now().timestamp_millis());
        assert_eq!(value["data"]["roasts"][0]["intensity"], 2);
        assert!(cache.is_persistent());
    }

    #[test]
    fn test_file_store_survives_new_cache_instance() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();

        ShardCache::new(Arc::new(FileStore::with_dir(dir.clone())), DAY)
            .write("en", 1, &sample_shard())
            .unwrap();

        let reopened = ShardCache::new(Arc::new(FileStore::with_dir(dir)), DAY);
        assert_eq!(reopened.read("en", 1), Some(sample_shard()));
    }

    #[test]
    fn test_detect_in_writable_dir_is_persistent() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("raas").join("scope");

        let cache = ShardCache::detect_in(Some(dir.clone()), DAY);

        assert!(cache.is_persistent());
        assert!(dir.is_dir());
        cache.write("en", 1, &sample_shard()).unwrap();
        assert!(dir.join("raas-en-1.json").exists());
    }

    #[test]
    fn test_detect_in_unusable_dir_falls_back_to_memory() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let cache = ShardCache::detect_in(Some(blocker.join("cache")), DAY);

        assert!(!cache.is_persistent());
        cache.write("en", 1, &sample_shard()).unwrap();
        assert_eq!(cache.read("en", 1), Some(sample_shard()));
    }

    #[test]
    fn test_detect_in_without_dir_is_in_memory() {
        let cache = ShardCache::detect_in(None, DAY);
        assert!(!cache.is_persistent());
        assert_eq!(cache.ttl(), DAY);
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = ShardCache::in_memory(DAY);
        cache.write("en", 1, &sample_shard()).unwrap();
        cache.write("bn", 1, &sample_shard()).unwrap();

        cache.clear().unwrap();

        assert!(cache.read("en", 1).is_none());
        assert!(cache.read("bn", 1).is_none());
    }
}
