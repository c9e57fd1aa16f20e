//! Rate Limiting Infrastructure
//!
//! A small TTL key-value store abstraction backing OTP codes, cooldowns,
//! counters and locks. Two backends are provided:
//!
//! - [`MemoryStore`]: in-process map, used in development and tests
//! - [`RedisStore`]: shared Redis instance, used when `REDIS_URL` is set
//!
//! [`StoreBackend`] picks one at startup and delegates to it.

mod backend;
mod memory;
mod redis_store;

use std::time::Duration;

use thiserror::Error;

pub use backend::StoreBackend;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Key-value store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection could not be established or was lost
    #[error("store connection failed: {0}")]
    Connection(String),

    /// Command was rejected or returned an unexpected reply
    #[error("store command failed: {0}")]
    Command(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// TTL key-value store
///
/// Every write carries its own TTL. Expired keys behave exactly like
/// missing ones.
#[trait_variant::make(KeyValueStore: Send)]
pub trait LocalKeyValueStore {
    /// Read a live value
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any previous value and TTL
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Remove keys; missing keys are ignored
    async fn delete(&self, keys: &[&str]) -> StoreResult<()>;

    /// Whether a live value exists
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Atomically increment a counter and return the new value.
    ///
    /// A missing key starts at 0 and receives `ttl`. An existing key keeps
    /// its original expiry, so the counter describes a fixed window.
    async fn incr(&self, key: &str, ttl: Duration) -> StoreResult<i64>;

    /// Remaining lifetime of a live key
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;
}
