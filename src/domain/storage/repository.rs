//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;

/// Generic storage trait for keyed entities
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Creates a new entity, returns error if already exists
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Updates an existing entity, returns `NotFound` if it does not exist
    async fn update(&self, entity: E) -> Result<E, DomainError>;
}

/// Extracts the key of an entity about to be written
pub(crate) fn required_key<E: StorageEntity>(entity: &E) -> Result<String, DomainError> {
    entity
        .key()
        .map(|key| key.to_string())
        .ok_or_else(|| DomainError::validation("Entity has no key"))
}
