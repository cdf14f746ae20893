//! PostgreSQL storage: one JSONB document per key

use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::storage::{required_key, Storage, StorageEntity};
use crate::domain::DomainError;

/// PostgreSQL connection settings
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/shop_cache".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Durable store keeping each entity as a JSONB row keyed by its decimal id
pub struct PostgresStorage<E>
where
    E: StorageEntity,
{
    pool: PgPool,
    table_name: String,
    _phantom: PhantomData<E>,
}

impl<E> Debug for PostgresStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl<E> PostgresStorage<E>
where
    E: StorageEntity,
{
    pub async fn connect(
        config: &PostgresConfig,
        table_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self {
            pool,
            table_name: table_name.into(),
            _phantom: PhantomData,
        })
    }

    /// Creates the backing table if it is missing
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                key VARCHAR(255) PRIMARY KEY,
                data JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table_name
        );

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    fn encode(entity: &E) -> Result<(String, serde_json::Value), DomainError> {
        let key = required_key(entity)?;
        let data = serde_json::to_value(entity)
            .map_err(|e| DomainError::storage(format!("Failed to serialize entity: {}", e)))?;
        Ok((key, data))
    }

    fn decode(row: &PgRow) -> Result<E, DomainError> {
        let data: serde_json::Value = row
            .try_get("data")
            .map_err(|e| DomainError::storage(format!("Missing data column: {}", e)))?;
        serde_json::from_value(data)
            .map_err(|e| DomainError::storage(format!("Failed to deserialize entity: {}", e)))
    }
}

#[async_trait]
impl<E> Storage<E> for PostgresStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let query = format!("SELECT data FROM {} WHERE key = $1", self.table_name);

        let row = sqlx::query(&query)
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get entity '{}': {}", key, e)))?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let (key, data) = Self::encode(&entity)?;
        let query = format!(
            "INSERT INTO {} (key, data) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING",
            self.table_name
        );

        let result = sqlx::query(&query)
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create entity '{}': {}", key, e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let (key, data) = Self::encode(&entity)?;
        let query = format!(
            "UPDATE {} SET data = $2, updated_at = NOW() WHERE key = $1",
            self.table_name
        );

        let result = sqlx::query(&query)
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update entity '{}': {}", key, e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Entity with key '{}' not found",
                key
            )));
        }

        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shop::{Shop, ShopId};

    #[test]
    fn test_postgres_config_new_keeps_pool_defaults() {
        let config = PostgresConfig::new("postgres://db/shops");

        assert_eq!(config.url, "postgres://db/shops");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 30);
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance (DATABASE_URL)"]
    async fn test_postgres_create_update_get() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let storage: PostgresStorage<Shop> =
            PostgresStorage::connect(&PostgresConfig::new(url), "shops_test")
                .await
                .unwrap();
        storage.ensure_table().await.unwrap();

        let id = ShopId::new(chrono::Utc::now().timestamp_micros() as u64);
        let mut shop = Shop::new(id, "Pg Shop", 1, "5 Db Rd");

        storage.create(shop.clone()).await.unwrap();
        assert!(matches!(
            storage.create(shop.clone()).await,
            Err(DomainError::Conflict { .. })
        ));

        shop.rename("Pg Shop Renamed");
        storage.update(shop).await.unwrap();

        let loaded = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Pg Shop Renamed");
    }
}
