//! Cache domain - shared cache abstraction and read-path policy

mod key;
mod policy;
mod repository;
mod value;

pub use key::{CacheKeys, DEFAULT_CACHE_PREFIX, DEFAULT_LOCK_PREFIX};
pub use policy::CachePolicy;
pub use repository::{Cache, CacheExt};
pub use value::CachedValue;

#[cfg(test)]
pub use repository::mock::MockCache;
