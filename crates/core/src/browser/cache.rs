//! Time-boxed cache for fetched repository code.
//!
//! An explicit object with its own TTL, injected into the browser, so the
//! same logic runs identically wherever it is hosted and tests can build
//! independent instances. Entries past the TTL are treated as absent and
//! purged on access.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

struct Entry<T> {
    stored_at: Instant,
    value: T,
}

/// Keyed TTL cache. Keys are composite strings ("owner-repo-kind").
pub struct TtlCache<T: Clone> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry. An expired entry is removed and reported absent.
    pub async fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: impl Into<String>, value: T) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.into(),
            Entry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));
        cache.insert("o-r-code", "payload".to_string()).await;
        assert_eq!(cache.get("o-r-code").await.as_deref(), Some("payload"));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("nope").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_absent_and_purged() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("k", 7).await;

        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(cache.get("k").await, None);
        // The read also evicted it.
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_just_inside_ttl_survives() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("k", 7).await;

        tokio::time::advance(Duration::from_secs(59)).await;

        assert_eq!(cache.get("k").await, Some(7));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1).await;
        cache.insert("b", 2).await;
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert_eq!(cache.get("a").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_value() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("k", 1).await;
        cache.insert("k", 2).await;
        assert_eq!(cache.get("k").await, Some(2));
        assert_eq!(cache.len().await, 1);
    }
}
