//! Shop repository trait

use super::{Shop, ShopId};
use crate::domain::error::DomainError;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Authoritative store for shops
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ShopRepository: Send + Sync + std::fmt::Debug {
    /// Finds a shop by ID
    async fn find_by_id(&self, id: ShopId) -> Result<Option<Shop>, DomainError>;

    /// Writes an existing shop, returning false when nothing was updated
    async fn update(&self, shop: &Shop) -> Result<bool, DomainError>;

    /// Inserts a new shop
    async fn create(&self, shop: Shop) -> Result<Shop, DomainError>;
}
