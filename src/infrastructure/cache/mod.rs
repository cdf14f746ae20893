//! Cache infrastructure - Cache implementations and the lease lock

mod factory;
mod in_memory;
mod lock;
mod redis;

pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use lock::{CacheLock, LockGuard};
pub use self::redis::{RedisCache, RedisCacheConfig};
