//! Shop infrastructure - durable store adapters

mod storage_repository;

pub use storage_repository::StorageShopRepository;
