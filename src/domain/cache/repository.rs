//! Cache trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::DomainError;

use super::value::CachedValue;

/// Shared key-value cache with TTL support
///
/// Values are raw strings so the trait stays dyn-compatible. Implementations
/// must make `set_nx_raw` atomic across every caller sharing the store, since
/// it is the only synchronization primitive the read path relies on.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a raw value from the cache
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw value in the cache with a TTL
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Sets a value only if the key doesn't exist, returning whether it was set
    async fn set_nx_raw(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, DomainError>;

    /// Deletes a value from the cache
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Gets the remaining TTL for a key, `None` if it is absent
    ///
    /// The read path uses it to report how long a contended lease has left.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError>;
}

/// Extension trait with the three-state read and typed writes
pub trait CacheExt: Cache {
    /// Reads a key and classifies it as absent, null sentinel or populated
    fn get_value<'a>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<CachedValue, DomainError>> + Send {
        async move { Ok(CachedValue::from_raw(self.get_raw(key).await?)) }
    }

    /// Serializes a value to JSON and stores it with a TTL
    fn set_json<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }

    /// Stores the null sentinel for a key
    fn set_null_sentinel<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send {
        async move { self.set_raw(key, CachedValue::NULL_SENTINEL, ttl).await }
    }
}

// Blanket implementation for all types implementing Cache
impl<T: Cache + ?Sized> CacheExt for T {}
