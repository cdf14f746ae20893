//! Cache and lock key derivation

use std::fmt::Display;

use crate::domain::DomainError;

/// Default namespace for cached shop records
pub const DEFAULT_CACHE_PREFIX: &str = "cache:shop:";

/// Default namespace for shop repopulation locks
pub const DEFAULT_LOCK_PREFIX: &str = "lock:shop:";

/// Derives the cache key and lock key for a record id
///
/// Both keys share the id space but live under distinct prefixes. Neither
/// prefix may be a prefix of the other, otherwise a lock key could be read
/// back as a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    cache_prefix: String,
    lock_prefix: String,
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self {
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            lock_prefix: DEFAULT_LOCK_PREFIX.to_string(),
        }
    }
}

impl CacheKeys {
    /// Creates key derivation with custom prefixes
    pub fn new(
        cache_prefix: impl Into<String>,
        lock_prefix: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let cache_prefix = cache_prefix.into();
        let lock_prefix = lock_prefix.into();

        if cache_prefix.is_empty() || lock_prefix.is_empty() {
            return Err(DomainError::configuration(
                "cache and lock prefixes must not be empty",
            ));
        }

        if cache_prefix.starts_with(&lock_prefix) || lock_prefix.starts_with(&cache_prefix) {
            return Err(DomainError::configuration(format!(
                "cache prefix '{}' and lock prefix '{}' overlap",
                cache_prefix, lock_prefix
            )));
        }

        Ok(Self {
            cache_prefix,
            lock_prefix,
        })
    }

    pub fn cache_key(&self, id: impl Display) -> String {
        format!("{}{}", self.cache_prefix, id)
    }

    pub fn lock_key(&self, id: impl Display) -> String {
        format!("{}{}", self.lock_prefix, id)
    }

    pub fn cache_prefix(&self) -> &str {
        &self.cache_prefix
    }

    pub fn lock_prefix(&self) -> &str {
        &self.lock_prefix
    }
}
