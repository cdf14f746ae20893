//! Three-state view of a cache slot

use serde::de::DeserializeOwned;

use crate::domain::DomainError;

/// What a cache lookup found for a key
///
/// The wire representation of `NullSentinel` is the empty string. Keeping the
/// distinction in a tagged enum means callers never confuse "confirmed
/// absent" with "not cached yet".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    /// The key is not present in the cache
    Absent,
    /// The durable store confirmed the record does not exist
    NullSentinel,
    /// A serialized record
    Populated(String),
}

impl CachedValue {
    /// Stored value marking a confirmed-absent record
    pub const NULL_SENTINEL: &'static str = "";

    /// Classifies a raw cache read
    pub fn from_raw(raw: Option<String>) -> Self {
        match raw {
            None => Self::Absent,
            Some(data) if data.is_empty() => Self::NullSentinel,
            Some(data) => Self::Populated(data),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Deserializes a populated value
    ///
    /// Returns `Ok(None)` for the sentinel and for an absent key.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>, DomainError> {
        match self {
            Self::Absent | Self::NullSentinel => Ok(None),
            Self::Populated(data) => serde_json::from_str(data).map(Some).map_err(|e| {
                DomainError::cache(format!("Failed to deserialize cache value: {}", e))
            }),
        }
    }
}
