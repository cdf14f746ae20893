//! Write path: persist first, then drop the cached copy

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::cache::{Cache, CacheKeys};
use crate::domain::shop::{Shop, ShopRepository};
use crate::domain::DomainError;

/// Applies shop writes to the durable store and invalidates the cache slot
///
/// The cache is only touched after the store confirmed the write. The next
/// read repopulates through [`CacheMutexReader`](super::CacheMutexReader).
#[derive(Debug)]
pub struct CacheInvalidator {
    cache: Arc<dyn Cache>,
    repository: Arc<dyn ShopRepository>,
    keys: CacheKeys,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn Cache>, repository: Arc<dyn ShopRepository>, keys: CacheKeys) -> Self {
        Self {
            cache,
            repository,
            keys,
        }
    }

    /// Updates an existing shop and invalidates its cache entry
    #[instrument(skip_all, fields(shop_id = tracing::field::Empty))]
    pub async fn update(&self, shop: &Shop) -> Result<(), DomainError> {
        let id = shop
            .id
            .ok_or_else(|| DomainError::validation("shop id must be set for update"))?;
        tracing::Span::current().record("shop_id", id.value());

        let updated = self.repository.update(shop).await.map_err(|e| {
            warn!(error = %e, "Durable store rejected update");
            DomainError::persistence(format!("update of shop {} failed: {}", id, e))
        })?;

        if !updated {
            warn!("Durable store reported no rows updated");
            return Err(DomainError::persistence(format!(
                "shop {} was not updated",
                id
            )));
        }

        let removed = self.cache.delete(&self.keys.cache_key(id)).await?;
        info!(removed, "Shop updated, cache entry invalidated");

        Ok(())
    }

    /// Inserts a new shop and clears any null sentinel cached for its id
    #[instrument(skip_all, fields(shop_id = tracing::field::Empty))]
    pub async fn create(&self, shop: Shop) -> Result<Shop, DomainError> {
        let id = shop
            .id
            .ok_or_else(|| DomainError::validation("shop id must be set for create"))?;
        tracing::Span::current().record("shop_id", id.value());

        let created = self.repository.create(shop).await?;

        let removed = self.cache.delete(&self.keys.cache_key(id)).await?;
        debug!(removed, "Shop created");

        Ok(created)
    }
}
