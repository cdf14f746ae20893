//! Expiry and retry policy for the mutex-guarded read path

use std::time::Duration;

use rand::Rng;

/// Tunables for cache population, the null sentinel and the repopulation lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Base TTL of a populated entry
    pub base_ttl: Duration,
    /// Upper bound (exclusive) of the random offset added to `base_ttl`
    pub jitter_window: Duration,
    /// TTL of the null sentinel
    pub null_ttl: Duration,
    /// Lease duration of the repopulation lock
    pub lock_ttl: Duration,
    /// Wait between lock attempts
    pub retry_backoff: Duration,
    /// Maximum number of lost lock attempts before giving up; `None` retries forever
    pub max_lock_retries: Option<u32>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            base_ttl: Duration::from_secs(30 * 60),
            jitter_window: Duration::from_secs(300),
            null_ttl: Duration::from_secs(2 * 60),
            lock_ttl: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(200),
            max_lock_retries: None,
        }
    }
}

impl CachePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_ttl(mut self, ttl: Duration) -> Self {
        self.base_ttl = ttl;
        self
    }

    pub fn with_jitter_window(mut self, window: Duration) -> Self {
        self.jitter_window = window;
        self
    }

    pub fn with_null_ttl(mut self, ttl: Duration) -> Self {
        self.null_ttl = ttl;
        self
    }

    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_max_lock_retries(mut self, retries: u32) -> Self {
        self.max_lock_retries = Some(retries);
        self
    }

    /// TTL for a freshly populated entry: `base_ttl + uniform[0, jitter_window)`
    ///
    /// Jitter has whole-second granularity.
    pub fn populated_ttl<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let window = self.jitter_window.as_secs();
        if window == 0 {
            return self.base_ttl;
        }

        self.base_ttl
            .saturating_add(Duration::from_secs(rng.gen_range(0..window)))
    }

    /// Returns true once `attempts` lost lock races exceed the configured ceiling
    pub fn retries_exhausted(&self, attempts: u32) -> bool {
        self.max_lock_retries.is_some_and(|max| attempts > max)
    }
}
