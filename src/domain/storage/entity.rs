//! Storage entity traits and types

use std::fmt::{Debug, Display};

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be used as storage keys
///
/// The `Display` rendering is the key used by string-keyed backends.
pub trait StorageKey: Clone + Debug + Display + Send + Sync + Eq + std::hash::Hash {}

impl<T> StorageKey for T where T: Clone + Debug + Display + Send + Sync + Eq + std::hash::Hash {}

/// Trait for types that can be stored
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type for this entity
    type Key: StorageKey;

    /// Returns the entity's key, or `None` if it has not been assigned one
    fn key(&self) -> Option<&Self::Key>;
}
