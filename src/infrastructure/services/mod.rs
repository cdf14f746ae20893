//! Shop cache services

mod cache_invalidator;
mod cache_mutex_reader;
mod shop_service;

pub use cache_invalidator::CacheInvalidator;
pub use cache_mutex_reader::CacheMutexReader;
pub use shop_service::{ShopService, SHOP_ID_REQUIRED, SHOP_NOT_FOUND, SHOP_UPDATE_FAILED};
