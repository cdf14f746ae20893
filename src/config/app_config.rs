use std::time::Duration;

use serde::Deserialize;

use crate::domain::cache::{CacheKeys, CachePolicy, DEFAULT_CACHE_PREFIX, DEFAULT_LOCK_PREFIX};
use crate::domain::DomainError;
use crate::infrastructure::cache::CacheConfig;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub storage: StorageSettings,
    pub shop_cache: ShopCacheSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    InMemory,
    Redis,
}

/// Cache store selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub redis_url: String,
    /// Namespace prepended to every Redis key
    pub key_prefix: Option<String>,
    pub max_capacity: u64,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    InMemory,
    Postgres,
}

/// Durable store selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub database_url: String,
    pub table: String,
}

/// Key namespaces and timing of the shop read path
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShopCacheSettings {
    pub cache_prefix: String,
    pub lock_prefix: String,
    pub base_ttl_minutes: u64,
    pub jitter_window_secs: u64,
    pub null_ttl_minutes: u64,
    pub lock_ttl_secs: u64,
    pub retry_backoff_ms: u64,
    /// Unset means waiters retry until the lock frees up
    pub max_lock_retries: Option<u32>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            max_capacity: 10_000,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: PostgresConfig::default().url,
            table: "shops".to_string(),
        }
    }
}

impl Default for ShopCacheSettings {
    fn default() -> Self {
        Self {
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            lock_prefix: DEFAULT_LOCK_PREFIX.to_string(),
            base_ttl_minutes: 30,
            jitter_window_secs: 300,
            null_ttl_minutes: 2,
            lock_ttl_secs: 10,
            retry_backoff_ms: 200,
            max_lock_retries: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        let config = match self.backend {
            CacheBackend::InMemory => CacheConfig::in_memory().with_max_capacity(self.max_capacity),
            CacheBackend::Redis => CacheConfig::redis(&self.redis_url),
        };

        match &self.key_prefix {
            Some(prefix) => config.with_key_prefix(prefix),
            None => config,
        }
    }
}

impl StorageSettings {
    pub fn to_storage_config(&self) -> StorageConfig {
        match self.backend {
            StorageBackend::InMemory => StorageConfig::in_memory(),
            StorageBackend::Postgres => StorageConfig::postgres_url(&self.database_url),
        }
    }
}

impl ShopCacheSettings {
    pub fn keys(&self) -> Result<CacheKeys, DomainError> {
        CacheKeys::new(&self.cache_prefix, &self.lock_prefix)
    }

    pub fn policy(&self) -> Result<CachePolicy, DomainError> {
        if self.lock_ttl_secs == 0 {
            return Err(DomainError::configuration("lock_ttl_secs must be positive"));
        }
        if self.null_ttl_minutes == 0 || self.base_ttl_minutes == 0 {
            return Err(DomainError::configuration(
                "base_ttl_minutes and null_ttl_minutes must be positive",
            ));
        }

        let base_ttl = minutes("base_ttl_minutes", self.base_ttl_minutes)?;
        let null_ttl = minutes("null_ttl_minutes", self.null_ttl_minutes)?;
        let jitter_window = Duration::from_secs(self.jitter_window_secs);

        if base_ttl.checked_add(jitter_window).is_none() {
            return Err(DomainError::configuration(
                "base_ttl_minutes plus jitter_window_secs is out of range",
            ));
        }

        let policy = CachePolicy::new()
            .with_base_ttl(base_ttl)
            .with_jitter_window(jitter_window)
            .with_null_ttl(null_ttl)
            .with_lock_ttl(Duration::from_secs(self.lock_ttl_secs))
            .with_retry_backoff(Duration::from_millis(self.retry_backoff_ms));

        Ok(match self.max_lock_retries {
            Some(retries) => policy.with_max_lock_retries(retries),
            None => policy,
        })
    }
}

fn minutes(name: &str, value: u64) -> Result<Duration, DomainError> {
    value
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| DomainError::configuration(format!("{} is out of range", name)))
}
