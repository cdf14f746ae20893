//! CLI module for the shop cache
//!
//! Provides subcommands operating on a single shop service instance:
//! - `get`: read a shop through the cache
//! - `update`: write a shop and invalidate its cache entry
//! - `seed`: insert shops into the durable store

pub mod get;
pub mod seed;
pub mod update;

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::services::ShopService;

/// Shop cache - cache-aside shop lookups with breakdown protection
#[derive(Parser)]
#[command(name = "shop-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Look up a shop by id
    Get(get::GetArgs),

    /// Update a shop from a JSON document
    Update(update::UpdateArgs),

    /// Insert shops from a JSON array
    Seed(seed::SeedArgs),
}

/// Loads configuration, installs logging and builds the service
///
/// Ctrl-C flips the shutdown signal, which aborts any lock backoff in flight.
async fn bootstrap() -> anyhow::Result<ShopService> {
    dotenvy::dotenv().ok();

    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    logging::init_logging(&config.logging)?;

    if let Some(e) = load_error {
        warn!(error = %e, "Falling back to default configuration");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            if shutdown_tx.send(true).is_err() {
                warn!("No reader listening for shutdown");
            }
        }
    });

    crate::create_shop_service_with_config(&config, shutdown_rx).await
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}
