//! Shop cache
//!
//! Cache-aside access to shop records with protection against:
//! - Cache penetration, through a short-lived null sentinel
//! - Cache breakdown, through a per-key repopulation lock with a lease
//! - Synchronized expiry, through randomized TTL jitter

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use domain::shop::{Shop, ShopRepository};
use infrastructure::cache::CacheFactory;
use infrastructure::services::ShopService;
use infrastructure::shop::StorageShopRepository;
use infrastructure::storage::StorageFactory;

/// Create the shop service with the default configuration
pub async fn create_shop_service(shutdown: watch::Receiver<bool>) -> anyhow::Result<ShopService> {
    create_shop_service_with_config(&AppConfig::default(), shutdown).await
}

/// Create the shop service from configuration
pub async fn create_shop_service_with_config(
    config: &AppConfig,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<ShopService> {
    let keys = config.shop_cache.keys()?;
    let policy = config.shop_cache.policy()?;

    let cache = CacheFactory::new()
        .create(&config.cache.to_cache_config())
        .await?;

    let storage =
        StorageFactory::create::<Shop>(&config.storage.to_storage_config(), &config.storage.table)
            .await?;
    let repository: Arc<dyn ShopRepository> = Arc::new(StorageShopRepository::new(storage));

    info!(
        cache_backend = ?config.cache.backend,
        storage_backend = ?config.storage.backend,
        cache_prefix = keys.cache_prefix(),
        lock_prefix = keys.lock_prefix(),
        "Shop service ready"
    );

    Ok(ShopService::new(cache, repository, keys, policy).with_shutdown(shutdown))
}
