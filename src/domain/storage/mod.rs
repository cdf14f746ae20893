//! Storage domain - Generic storage abstraction layer

mod entity;
mod repository;

pub use entity::{StorageEntity, StorageKey};
pub use repository::Storage;
pub(crate) use repository::required_key;

#[cfg(test)]
pub use repository::mock;
