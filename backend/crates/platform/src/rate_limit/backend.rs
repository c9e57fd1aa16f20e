use std::time::Duration;

use super::{KeyValueStore, MemoryStore, RedisStore, StoreResult};

/// Store selected at startup
#[derive(Clone)]
pub enum StoreBackend {
    Memory(MemoryStore),
    Redis(RedisStore),
}

impl StoreBackend {
    /// Connect to Redis when a URL is given, otherwise fall back to memory
    pub async fn from_url(url: Option<&str>) -> StoreResult<Self> {
        match url {
            Some(url) if !url.trim().is_empty() => {
                Ok(StoreBackend::Redis(RedisStore::connect(url).await?))
            }
            _ => {
                tracing::warn!("REDIS_URL not set, using in-memory store (single process only)");
                Ok(StoreBackend::Memory(MemoryStore::new()))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Memory(_) => "memory",
            StoreBackend::Redis(_) => "redis",
        }
    }

    /// The in-memory store, when selected
    pub fn as_memory(&self) -> Option<&MemoryStore> {
        match self {
            StoreBackend::Memory(m) => Some(m),
            StoreBackend::Redis(_) => None,
        }
    }
}

impl KeyValueStore for StoreBackend {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self {
            StoreBackend::Memory(s) => s.get(key).await,
            StoreBackend::Redis(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        match self {
            StoreBackend::Memory(s) => s.set(key, value, ttl).await,
            StoreBackend::Redis(s) => s.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, keys: &[&str]) -> StoreResult<()> {
        match self {
            StoreBackend::Memory(s) => s.delete(keys).await,
            StoreBackend::Redis(s) => s.delete(keys).await,
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        match self {
            StoreBackend::Memory(s) => s.exists(key).await,
            StoreBackend::Redis(s) => s.exists(key).await,
        }
    }

    async fn incr(&self, key: &str, ttl: Duration) -> StoreResult<i64> {
        match self {
            StoreBackend::Memory(s) => s.incr(key, ttl).await,
            StoreBackend::Redis(s) => s.incr(key, ttl).await,
        }
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        match self {
            StoreBackend::Memory(s) => s.ttl(key).await,
            StoreBackend::Redis(s) => s.ttl(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_to_memory() {
        let store = StoreBackend::from_url(None).await.unwrap();
        assert_eq!(store.name(), "memory");
        assert!(store.as_memory().is_some());

        let blank = StoreBackend::from_url(Some("  ")).await.unwrap();
        assert_eq!(blank.name(), "memory");
    }

    #[tokio::test]
    async fn test_delegates_to_memory() {
        let store = StoreBackend::from_url(None).await.unwrap();
        store
            .set("k", "v", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.incr("n", Duration::from_secs(10)).await.unwrap(), 1);
    }
}
