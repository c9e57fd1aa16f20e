//! In-process TTL store

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use super::{KeyValueStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Map-backed store with lazy expiry
///
/// Clones share the same map. Expired entries are dropped on access and
/// by [`MemoryStore::purge_expired`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Command("memory store mutex poisoned".to_string()))
    }

    /// Look up a live entry, dropping it if it has expired
    fn live<'a>(
        map: &'a mut HashMap<String, Entry>,
        key: &str,
        now: Instant,
    ) -> Option<&'a mut Entry> {
        if map.get(key).is_some_and(|e| !e.is_live(now)) {
            map.remove(key);
        }
        map.get_mut(key)
    }

    /// Drop every expired entry and return how many were removed
    pub fn purge_expired(&self) -> StoreResult<usize> {
        let now = Instant::now();
        let mut map = self.lock()?;
        let before = map.len();
        map.retain(|_, e| e.is_live(now));
        Ok(before - map.len())
    }

    /// Number of stored entries, including not yet purged expired ones
    pub fn len(&self) -> usize {
        self.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        let mut map = self.lock()?;
        Ok(Self::live(&mut map, key, now).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let expires_at = Instant::now() + ttl;
        self.lock()?.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> StoreResult<()> {
        let mut map = self.lock()?;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let now = Instant::now();
        let mut map = self.lock()?;
        Ok(Self::live(&mut map, key, now).is_some())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> StoreResult<i64> {
        let now = Instant::now();
        let mut map = self.lock()?;

        if let Some(entry) = Self::live(&mut map, key, now) {
            let current: i64 = entry.value.parse().map_err(|_| {
                StoreError::Command(format!("value at {key} is not an integer"))
            })?;
            let next = current + 1;
            entry.value = next.to_string();
            return Ok(next);
        }

        map.insert(
            key.to_string(),
            Entry {
                value: "1".to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(1)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let now = Instant::now();
        let mut map = self.lock()?;
        Ok(Self::live(&mut map, key, now).map(|e| e.expires_at - now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_set_get_expires() {
        let store = MemoryStore::new();
        store.set("otp:a@b.com", "1234", MINUTE).await.unwrap();

        assert_eq!(
            store.get("otp:a@b.com").await.unwrap(),
            Some("1234".to_string())
        );
        assert!(store.exists("otp:a@b.com").await.unwrap());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.exists("otp:a@b.com").await.unwrap());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("otp:a@b.com").await.unwrap(), None);
        assert!(!store.exists("otp:a@b.com").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_value_and_ttl() {
        let store = MemoryStore::new();
        store.set("k", "1", MINUTE).await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;
        store.set("k", "2", MINUTE).await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(store.get("k").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_many() {
        let store = MemoryStore::new();
        store.set("a", "1", MINUTE).await.unwrap();
        store.set("b", "2", MINUTE).await.unwrap();

        store.delete(&["a", "b", "missing"]).await.unwrap();
        assert!(!store.exists("a").await.unwrap());
        assert!(!store.exists("b").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_incr_fixed_window() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("count", MINUTE).await.unwrap(), 1);

        tokio::time::advance(Duration::from_secs(40)).await;
        assert_eq!(store.incr("count", MINUTE).await.unwrap(), 2);

        // Second increment must not extend the original window
        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(!store.exists("count").await.unwrap());
        assert_eq!(store.incr("count", MINUTE).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incr_non_integer() {
        let store = MemoryStore::new();
        store.set("k", "abc", MINUTE).await.unwrap();
        assert!(matches!(
            store.incr("k", MINUTE).await,
            Err(StoreError::Command(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl() {
        let store = MemoryStore::new();
        assert_eq!(store.ttl("k").await.unwrap(), None);

        store.set("k", "v", MINUTE).await.unwrap();
        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(store.ttl("k").await.unwrap(), Some(Duration::from_secs(45)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        store.set("short", "1", Duration::from_secs(1)).await.unwrap();
        store.set("long", "1", MINUTE).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("k", "v", MINUTE).await.unwrap();
        assert_eq!(other.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_incr() {
        let store = MemoryStore::new();
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.incr("c", MINUTE).await.unwrap()
            }));
        }

        let mut seen = Vec::new();
        for h in handles {
            seen.push(h.await.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=50).collect::<Vec<i64>>());
    }
}
