use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::storage::StorageEntity;

/// Numeric shop identifier, rendered in decimal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopId(u64);

impl ShopId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ShopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ShopId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for ShopId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A shop listing, the record served through the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    /// Unset until the shop has been persisted
    #[serde(default)]
    pub id: Option<ShopId>,
    pub name: String,
    pub type_id: u64,
    /// Comma separated image URLs
    #[serde(default)]
    pub images: String,
    #[serde(default)]
    pub area: String,
    pub address: String,
    /// Longitude
    #[serde(default)]
    pub x: f64,
    /// Latitude
    #[serde(default)]
    pub y: f64,
    /// Average price in cents
    #[serde(default)]
    pub avg_price: u64,
    #[serde(default)]
    pub sold: u32,
    #[serde(default)]
    pub comments: u32,
    /// Rating multiplied by 10, e.g. 37 for 3.7 stars
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub open_hours: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Shop {
    pub fn new(
        id: impl Into<ShopId>,
        name: impl Into<String>,
        type_id: u64,
        address: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Some(id.into()),
            name: name.into(),
            type_id,
            images: String::new(),
            area: String::new(),
            address: address.into(),
            x: 0.0,
            y: 0.0,
            avg_price: 0,
            sold: 0,
            comments: 0,
            score: 0,
            open_hours: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = area.into();
        self
    }

    pub fn with_location(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_avg_price(mut self, avg_price: u64) -> Self {
        self.avg_price = avg_price;
        self
    }

    pub fn with_open_hours(mut self, open_hours: impl Into<String>) -> Self {
        self.open_hours = open_hours.into();
        self
    }

    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }

    /// Updates the name and bumps `updated_at`
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for Shop {
    type Key = ShopId;

    fn key(&self) -> Option<&Self::Key> {
        self.id.as_ref()
    }
}
