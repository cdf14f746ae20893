//! Cache-aside reads guarded by a per-key repopulation lock
//!
//! A miss does not go straight to the durable store. The caller first takes
//! the lease on the shop's lock key; only the winner reads the store and
//! writes the result back, everybody else sleeps for the retry backoff and
//! looks at the cache again. A hot key that expires therefore costs one store
//! read per lease window instead of one per request.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::domain::cache::{Cache, CacheExt, CacheKeys, CachePolicy, CachedValue};
use crate::domain::shop::{Shop, ShopId, ShopRepository};
use crate::domain::DomainError;
use crate::infrastructure::cache::CacheLock;

/// Breakdown-safe reader for shops
#[derive(Debug)]
pub struct CacheMutexReader {
    cache: Arc<dyn Cache>,
    repository: Arc<dyn ShopRepository>,
    lock: CacheLock,
    keys: CacheKeys,
    policy: CachePolicy,
    shutdown: Option<watch::Receiver<bool>>,
}

impl CacheMutexReader {
    pub fn new(
        cache: Arc<dyn Cache>,
        repository: Arc<dyn ShopRepository>,
        keys: CacheKeys,
        policy: CachePolicy,
    ) -> Self {
        let lock = CacheLock::new(cache.clone(), policy.lock_ttl);

        Self {
            cache,
            repository,
            lock,
            keys,
            policy,
            shutdown: None,
        }
    }

    /// Aborts backoff waits with [`DomainError::Interrupted`] once the channel holds `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Reads a shop, returning `Ok(None)` when the durable store has no such shop
    #[instrument(skip_all, fields(shop_id = %id))]
    pub async fn read(&self, id: ShopId) -> Result<Option<Shop>, DomainError> {
        let cache_key = self.keys.cache_key(id);
        let lock_key = self.keys.lock_key(id);
        let mut lost_races: u32 = 0;

        loop {
            let cached = self.cache.get_value(&cache_key).await?;

            match cached {
                CachedValue::Populated(_) => {
                    debug!("Cache hit");
                    return cached.decode();
                }
                CachedValue::NullSentinel => {
                    debug!("Null sentinel hit");
                    return Ok(None);
                }
                CachedValue::Absent => {}
            }

            if let Some(guard) = self.lock.try_acquire(&lock_key).await? {
                let result = self.repopulate(id, &cache_key).await;

                if let Err(e) = guard.release().await {
                    warn!(lock_key = %lock_key, error = %e, "Failed to release lock, lease will expire");
                }

                return result;
            }

            lost_races += 1;
            if lost_races == 1 {
                self.report_contended_lease(&lock_key).await;
            }
            if self.policy.retries_exhausted(lost_races) {
                warn!(attempts = lost_races, "Giving up on contended lock");
                return Err(DomainError::lock_contention(format!(
                    "lock '{}' still held after {} attempts",
                    lock_key, lost_races
                )));
            }

            debug!(attempt = lost_races, "Lock busy, backing off");
            self.backoff().await?;
        }
    }

    /// Runs with the lock held: load from the durable store and write back
    async fn repopulate(&self, id: ShopId, cache_key: &str) -> Result<Option<Shop>, DomainError> {
        // The previous holder may have filled the slot between our miss and our acquire
        let cached = self.cache.get_value(cache_key).await?;
        if !cached.is_absent() {
            debug!("Cache filled while acquiring lock");
            return cached.decode();
        }

        match self.repository.find_by_id(id).await? {
            None => {
                self.cache
                    .set_null_sentinel(cache_key, self.policy.null_ttl)
                    .await?;
                info!(
                    ttl_secs = self.policy.null_ttl.as_secs(),
                    "Shop not found, cached null sentinel"
                );
                Ok(None)
            }
            Some(shop) => {
                let ttl = self.policy.populated_ttl(&mut rand::thread_rng());
                self.cache.set_json(cache_key, &shop, ttl).await?;
                info!(ttl_secs = ttl.as_secs(), "Repopulated shop cache");
                Ok(Some(shop))
            }
        }
    }

    /// Logs how long the current holder's lease has left; a failed lookup only costs the log line
    async fn report_contended_lease(&self, lock_key: &str) {
        match self.cache.ttl(lock_key).await {
            Ok(Some(remaining)) => debug!(
                lock_key,
                remaining_ms = remaining.as_millis() as u64,
                "Lock held by another caller"
            ),
            Ok(None) => debug!(lock_key, "Lock released before its lease could be read"),
            Err(e) => debug!(lock_key, error = %e, "Could not read lease TTL"),
        }
    }

    async fn backoff(&self) -> Result<(), DomainError> {
        let mut shutdown = self.shutdown.clone();

        let interrupted = async {
            if let Some(rx) = shutdown.as_mut() {
                // An error means the sender is gone and no interrupt can arrive
                if rx.wait_for(|stop| *stop).await.is_ok() {
                    return;
                }
            }
            std::future::pending::<()>().await
        };

        tokio::select! {
            _ = tokio::time::sleep(self.policy.retry_backoff) => Ok(()),
            _ = interrupted => Err(DomainError::interrupted(
                "lock backoff aborted by shutdown",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::domain::shop::MockShopRepository;
    use crate::infrastructure::cache::InMemoryCache;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Durable store that counts reads and can be slowed down
    #[derive(Debug, Default)]
    struct CountingRepository {
        shops: Vec<Shop>,
        delay: Duration,
        reads: AtomicUsize,
    }

    impl CountingRepository {
        fn with_shops(shops: Vec<Shop>) -> Self {
            Self {
                shops,
                ..Default::default()
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ShopRepository for CountingRepository {
        async fn find_by_id(&self, id: ShopId) -> Result<Option<Shop>, DomainError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.shops.iter().find(|s| s.id == Some(id)).cloned())
        }

        async fn update(&self, _shop: &Shop) -> Result<bool, DomainError> {
            Ok(true)
        }

        async fn create(&self, shop: Shop) -> Result<Shop, DomainError> {
            Ok(shop)
        }
    }

    fn fast_policy() -> CachePolicy {
        CachePolicy::default()
            .with_retry_backoff(Duration::from_millis(20))
            .with_lock_ttl(Duration::from_secs(5))
    }

    fn tea_house() -> Shop {
        Shop::new(7u64, "Tea House", 1, "1 Main St")
    }

    fn reader(cache: Arc<dyn Cache>, repository: Arc<dyn ShopRepository>) -> CacheMutexReader {
        CacheMutexReader::new(cache, repository, CacheKeys::default(), fast_policy())
    }

    #[tokio::test]
    async fn test_missing_shop_caches_null_sentinel() {
        let cache = Arc::new(MockCache::new());
        let mut repository = MockShopRepository::new();
        repository
            .expect_find_by_id()
            .withf(|id| *id == ShopId::new(42))
            .times(1)
            .returning(|_| Ok(None));

        let reader = reader(cache.clone(), Arc::new(repository));

        assert!(reader.read(ShopId::new(42)).await.unwrap().is_none());
        assert_eq!(cache.raw("cache:shop:42"), Some(String::new()));
        assert_eq!(
            cache.recorded_ttl("cache:shop:42"),
            Some(Duration::from_secs(120))
        );
        assert!(cache.raw("lock:shop:42").is_none());
    }

    #[tokio::test]
    async fn test_sentinel_suppresses_store_reads() {
        let cache = Arc::new(InMemoryCache::new());
        let repository = Arc::new(CountingRepository::default());
        let reader = reader(cache, repository.clone());

        assert!(reader.read(ShopId::new(42)).await.unwrap().is_none());
        assert!(reader.read(ShopId::new(42)).await.unwrap().is_none());
        assert!(reader.read(ShopId::new(42)).await.unwrap().is_none());

        assert_eq!(repository.reads(), 1);
    }

    #[tokio::test]
    async fn test_miss_populates_with_jittered_ttl_and_releases_lock() {
        let cache = Arc::new(MockCache::new());
        let mut repository = MockShopRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(Some(tea_house())));

        let reader = reader(cache.clone(), Arc::new(repository));

        let shop = reader.read(ShopId::new(7)).await.unwrap().unwrap();
        assert_eq!(shop.name, "Tea House");

        let cached: Shop = serde_json::from_str(&cache.raw("cache:shop:7").unwrap()).unwrap();
        assert_eq!(cached, shop);

        let ttl = cache.recorded_ttl("cache:shop:7").unwrap();
        assert!(ttl >= Duration::from_secs(1800));
        assert!(ttl < Duration::from_secs(2100));

        assert!(cache.raw("lock:shop:7").is_none());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let shop = tea_house();
        let cache = Arc::new(MockCache::new().with_entry(
            "cache:shop:7",
            &serde_json::to_string(&shop).unwrap(),
            None,
        ));
        let mut repository = MockShopRepository::new();
        repository.expect_find_by_id().never();

        let reader = reader(cache, Arc::new(repository));

        assert_eq!(reader.read(ShopId::new(7)).await.unwrap(), Some(shop));
    }

    #[tokio::test]
    async fn test_corrupt_cache_value_is_an_error() {
        let cache = Arc::new(MockCache::new().with_entry("cache:shop:7", "{not json", None));
        let mut repository = MockShopRepository::new();
        repository.expect_find_by_id().never();

        let reader = reader(cache, Arc::new(repository));

        let result = reader.read(ShopId::new(7)).await;
        assert!(matches!(result, Err(DomainError::Cache { .. })));
    }

    #[tokio::test]
    async fn test_lock_released_when_store_fails() {
        let cache = Arc::new(MockCache::new());
        let mut repository = MockShopRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Err(DomainError::storage("connection reset")));

        let reader = reader(cache.clone(), Arc::new(repository));

        let result = reader.read(ShopId::new(7)).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
        assert!(cache.raw("lock:shop:7").is_none());
        assert!(cache.raw("cache:shop:7").is_none());
    }

    #[tokio::test]
    async fn test_cache_errors_propagate() {
        let cache = Arc::new(MockCache::new().with_error("redis down"));
        let mut repository = MockShopRepository::new();
        repository.expect_find_by_id().never();

        let reader = reader(cache, Arc::new(repository));

        let result = reader.read(ShopId::new(7)).await;
        assert!(matches!(result, Err(DomainError::Cache { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_hit_store_once() {
        let cache = Arc::new(InMemoryCache::new());
        let repository = Arc::new(
            CountingRepository::with_shops(vec![tea_house()]).with_delay(Duration::from_millis(100)),
        );
        let reader = Arc::new(reader(cache, repository.clone()));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let reader = reader.clone();
                tokio::spawn(async move { reader.read(ShopId::new(7)).await })
            })
            .collect();

        let results = futures::future::join_all(handles).await;

        for result in results {
            let shop = result.unwrap().unwrap().unwrap();
            assert_eq!(shop.name, "Tea House");
        }
        assert_eq!(repository.reads(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_of_missing_shop_hit_store_once() {
        let cache = Arc::new(InMemoryCache::new());
        let repository =
            Arc::new(CountingRepository::default().with_delay(Duration::from_millis(50)));
        let reader = Arc::new(reader(cache, repository.clone()));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let reader = reader.clone();
                tokio::spawn(async move { reader.read(ShopId::new(42)).await })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            assert!(result.unwrap().unwrap().is_none());
        }
        assert_eq!(repository.reads(), 1);
    }

    #[tokio::test]
    async fn test_loser_backs_off_then_reads_cache() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let repository = Arc::new(
            CountingRepository::with_shops(vec![tea_house()]).with_delay(Duration::from_millis(60)),
        );
        let reader = reader(cache.clone(), repository.clone());

        let (first, second) = tokio::join!(reader.read(ShopId::new(7)), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            reader.read(ShopId::new(7)).await
        });

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(repository.reads(), 1);
        assert!(cache.get_raw("lock:shop:7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_waiter_takes_over_after_lease_expiry() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let repository = Arc::new(CountingRepository::with_shops(vec![tea_house()]));
        let policy = fast_policy().with_lock_ttl(Duration::from_millis(200));
        let reader = CacheMutexReader::new(
            cache.clone(),
            repository.clone(),
            CacheKeys::default(),
            policy,
        );

        // A crashed holder left its lease behind
        assert!(cache
            .set_nx_raw("lock:shop:7", "1", Duration::from_millis(200))
            .await
            .unwrap());

        let started = std::time::Instant::now();
        let shop = reader.read(ShopId::new(7)).await.unwrap();

        assert!(shop.is_some());
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert_eq!(repository.reads(), 1);
    }

    #[tokio::test]
    async fn test_retry_ceiling() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let mut repository = MockShopRepository::new();
        repository.expect_find_by_id().never();

        let policy = fast_policy().with_max_lock_retries(2);
        let reader =
            CacheMutexReader::new(cache.clone(), Arc::new(repository), CacheKeys::default(), policy);

        cache
            .set_nx_raw("lock:shop:7", "1", Duration::from_secs(10))
            .await
            .unwrap();

        let result = reader.read(ShopId::new(7)).await;
        assert!(matches!(result, Err(DomainError::LockContention { .. })));
    }

    #[tokio::test]
    async fn test_lease_lookup_leaves_foreign_lock_untouched() {
        let cache = Arc::new(MockCache::new().with_entry(
            "lock:shop:7",
            "1",
            Some(Duration::from_secs(10)),
        ));
        let mut repository = MockShopRepository::new();
        repository.expect_find_by_id().never();

        let policy = fast_policy().with_max_lock_retries(0);
        let reader =
            CacheMutexReader::new(cache.clone(), Arc::new(repository), CacheKeys::default(), policy);

        let result = reader.read(ShopId::new(7)).await;

        assert!(matches!(result, Err(DomainError::LockContention { .. })));
        assert_eq!(cache.raw("lock:shop:7"), Some("1".to_string()));
        assert_eq!(
            cache.ttl("lock:shop:7").await.unwrap(),
            Some(Duration::from_secs(10))
        );
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_backoff() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let mut repository = MockShopRepository::new();
        repository.expect_find_by_id().never();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reader = reader(cache.clone(), Arc::new(repository)).with_shutdown(shutdown_rx);

        cache
            .set_nx_raw("lock:shop:7", "1", Duration::from_secs(10))
            .await
            .unwrap();

        let (result, _) = tokio::join!(reader.read(ShopId::new(7)), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            shutdown_tx.send(true).unwrap();
        });

        assert!(matches!(result, Err(DomainError::Interrupted { .. })));
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_does_not_interrupt() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let repository = Arc::new(CountingRepository::with_shops(vec![tea_house()]));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(shutdown_tx);

        let policy = fast_policy().with_lock_ttl(Duration::from_millis(100));
        let reader = CacheMutexReader::new(
            cache.clone(),
            repository,
            CacheKeys::default(),
            policy,
        )
        .with_shutdown(shutdown_rx);

        cache
            .set_nx_raw("lock:shop:7", "1", Duration::from_millis(100))
            .await
            .unwrap();

        assert!(reader.read(ShopId::new(7)).await.unwrap().is_some());
    }
}
