//! Lease lock built on the cache's atomic set-if-absent
//!
//! The lock value is a placeholder: holding the key is the whole signal and
//! there is no ownership check on release. The lease TTL bounds how long a
//! crashed holder can keep other callers out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

const LOCK_VALUE: &str = "1";

/// Acquires leases on lock keys in a shared cache
#[derive(Debug, Clone)]
pub struct CacheLock {
    cache: Arc<dyn Cache>,
    lease: Duration,
}

impl CacheLock {
    pub fn new(cache: Arc<dyn Cache>, lease: Duration) -> Self {
        Self { cache, lease }
    }

    /// Tries to take the lock once, returning `None` if another holder has it
    pub async fn try_acquire(&self, lock_key: &str) -> Result<Option<LockGuard>, DomainError> {
        let acquired = self
            .cache
            .set_nx_raw(lock_key, LOCK_VALUE, self.lease)
            .await?;

        if !acquired {
            debug!(lock_key, "Lock held by another caller");
            return Ok(None);
        }

        debug!(lock_key, lease_ms = self.lease.as_millis() as u64, "Lock acquired");

        Ok(Some(LockGuard {
            cache: self.cache.clone(),
            key: lock_key.to_string(),
            released: false,
        }))
    }
}

/// A held lease
///
/// Call [`LockGuard::release`] on every path. If the guard is dropped while
/// still held (a panic, or the owning future was cancelled) the delete is
/// spawned on the current tokio runtime; without a runtime the lease simply
/// expires.
#[derive(Debug)]
#[must_use = "a lock guard should be released explicitly"]
pub struct LockGuard {
    cache: Arc<dyn Cache>,
    key: String,
    released: bool,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Deletes the lock key
    pub async fn release(mut self) -> Result<(), DomainError> {
        self.released = true;
        self.cache.delete(&self.key).await?;
        debug!(lock_key = %self.key, "Lock released");
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let cache = self.cache.clone();
        let key = std::mem::take(&mut self.key);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = cache.delete(&key).await {
                        warn!(lock_key = %key, error = %e, "Failed to release abandoned lock");
                    }
                });
            }
            Err(_) => {
                warn!(lock_key = %key, "No runtime to release abandoned lock, waiting for lease expiry");
            }
        }
    }
}
