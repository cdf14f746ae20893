//! Storage-backed shop repository

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::shop::{Shop, ShopId, ShopRepository};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Storage-backed implementation of ShopRepository
#[derive(Debug)]
pub struct StorageShopRepository {
    storage: Arc<dyn Storage<Shop>>,
}

impl StorageShopRepository {
    /// Create a new storage-backed repository
    pub fn new(storage: Arc<dyn Storage<Shop>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ShopRepository for StorageShopRepository {
    async fn find_by_id(&self, id: ShopId) -> Result<Option<Shop>, DomainError> {
        self.storage.get(&id).await
    }

    async fn update(&self, shop: &Shop) -> Result<bool, DomainError> {
        match self.storage.update(shop.clone()).await {
            Ok(_) => Ok(true),
            Err(DomainError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, shop: Shop) -> Result<Shop, DomainError> {
        self.storage.create(shop).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::mock::MockStorage;
    use crate::infrastructure::storage::InMemoryStorage;

    fn repository_with(shops: Vec<Shop>) -> StorageShopRepository {
        StorageShopRepository::new(Arc::new(InMemoryStorage::with_entities(shops)))
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let repo = repository_with(vec![Shop::new(7u64, "Tea House", 1, "1 Main St")]);

        let found = repo.find_by_id(ShopId::new(7)).await.unwrap();
        assert_eq!(found.unwrap().name, "Tea House");

        assert!(repo.find_by_id(ShopId::new(8)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_existing() {
        let repo = repository_with(vec![Shop::new(7u64, "Tea House", 1, "1 Main St")]);

        let mut shop = repo.find_by_id(ShopId::new(7)).await.unwrap().unwrap();
        shop.rename("Coffee House");

        assert!(repo.update(&shop).await.unwrap());
        let reloaded = repo.find_by_id(ShopId::new(7)).await.unwrap().unwrap();
        assert_eq!(reloaded.name, "Coffee House");
    }

    #[tokio::test]
    async fn test_update_missing_reports_false() {
        let repo = repository_with(Vec::new());

        let updated = repo
            .update(&Shop::new(99u64, "Ghost", 1, "Nowhere"))
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_storage_errors_propagate() {
        let repo = StorageShopRepository::new(Arc::new(
            MockStorage::<Shop>::new().with_error("disk full"),
        ));

        let result = repo.update(&Shop::new(1u64, "Any", 1, "addr")).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_create() {
        let repo = repository_with(Vec::new());

        repo.create(Shop::new(3u64, "New", 2, "3 Rd")).await.unwrap();
        assert!(repo.find_by_id(ShopId::new(3)).await.unwrap().is_some());
    }
}
