//! Shop query and update entry points

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::domain::cache::{Cache, CacheKeys, CachePolicy};
use crate::domain::shop::{Shop, ShopId, ShopRepository};
use crate::domain::DomainError;

use super::{CacheInvalidator, CacheMutexReader};

/// Message returned when a shop does not exist
pub const SHOP_NOT_FOUND: &str = "shop not found";
/// Message returned when an update carries no id
pub const SHOP_ID_REQUIRED: &str = "shop id must not be empty";
/// Message returned when the durable store rejected an update
pub const SHOP_UPDATE_FAILED: &str = "failed to update shop";

/// Caller-facing shop service
///
/// Turns the reader's `Ok(None)` into [`DomainError::NotFound`] and gives
/// validation and persistence failures stable messages.
#[derive(Debug)]
pub struct ShopService {
    reader: CacheMutexReader,
    invalidator: CacheInvalidator,
}

impl ShopService {
    pub fn new(
        cache: Arc<dyn Cache>,
        repository: Arc<dyn ShopRepository>,
        keys: CacheKeys,
        policy: CachePolicy,
    ) -> Self {
        Self {
            reader: CacheMutexReader::new(cache.clone(), repository.clone(), keys.clone(), policy),
            invalidator: CacheInvalidator::new(cache, repository, keys),
        }
    }

    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.reader = self.reader.with_shutdown(shutdown);
        self
    }

    pub async fn query_shop_by_id(&self, id: ShopId) -> Result<Shop, DomainError> {
        match self.reader.read(id).await? {
            Some(shop) => Ok(shop),
            None => {
                debug!(shop_id = %id, "Shop not found");
                Err(DomainError::not_found(SHOP_NOT_FOUND))
            }
        }
    }

    pub async fn update_shop(&self, shop: &Shop) -> Result<(), DomainError> {
        self.invalidator.update(shop).await.map_err(|e| match e {
            DomainError::Validation { .. } => DomainError::validation(SHOP_ID_REQUIRED),
            DomainError::Persistence { .. } => DomainError::persistence(SHOP_UPDATE_FAILED),
            other => other,
        })
    }

    /// Inserts shops, stopping at the first failure
    pub async fn seed(&self, shops: Vec<Shop>) -> Result<usize, DomainError> {
        let mut inserted = 0;
        for shop in shops {
            self.invalidator.create(shop).await?;
            inserted += 1;
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shop::MockShopRepository;
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::shop::StorageShopRepository;
    use crate::infrastructure::storage::InMemoryStorage;

    fn service_with(repository: impl ShopRepository + 'static) -> ShopService {
        ShopService::new(
            Arc::new(InMemoryCache::new()),
            Arc::new(repository),
            CacheKeys::default(),
            CachePolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_query_missing_shop() {
        let mut repository = MockShopRepository::new();
        repository.expect_find_by_id().times(1).returning(|_| Ok(None));

        let service = service_with(repository);

        let err = service.query_shop_by_id(ShopId::new(42)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(err.to_string(), "Not found: shop not found");

        // Second lookup is served by the sentinel
        let err = service.query_shop_by_id(ShopId::new(42)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_messages() {
        let mut repository = MockShopRepository::new();
        repository.expect_update().times(1).returning(|_| Ok(false));

        let service = service_with(repository);

        let err = service
            .update_shop(&Shop::new(1u64, "x", 1, "y").without_id())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: shop id must not be empty");

        let err = service
            .update_shop(&Shop::new(1u64, "x", 1, "y"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Persistence error: failed to update shop");
    }

    #[tokio::test]
    async fn test_seed_then_query() {
        let storage = Arc::new(InMemoryStorage::<Shop>::new());
        let service = service_with(StorageShopRepository::new(storage));

        let inserted = service
            .seed(vec![
                Shop::new(1u64, "One", 1, "1 St"),
                Shop::new(2u64, "Two", 1, "2 St"),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let shop = service.query_shop_by_id(ShopId::new(2)).await.unwrap();
        assert_eq!(shop.name, "Two");
    }

    #[tokio::test]
    async fn test_seed_rejects_unkeyed_shop() {
        let storage = Arc::new(InMemoryStorage::<Shop>::new());
        let service = service_with(StorageShopRepository::new(storage));

        let result = service
            .seed(vec![Shop::new(1u64, "Nameless", 1, "addr").without_id()])
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }
}
