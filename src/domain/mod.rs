//! Domain layer - Core business logic and entities

pub mod cache;
pub mod error;
pub mod shop;
pub mod storage;

pub use cache::{Cache, CacheExt, CacheKeys, CachePolicy, CachedValue};
pub use error::DomainError;
pub use shop::{Shop, ShopId, ShopRepository};
pub use storage::{Storage, StorageEntity, StorageKey};
