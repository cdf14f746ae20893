//! Seed command - inserts shops into the durable store

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::domain::shop::Shop;

/// Arguments for the seed command
#[derive(Args, Clone)]
pub struct SeedArgs {
    /// JSON array of shops
    #[arg(long)]
    pub file: PathBuf,
}

pub async fn run(args: SeedArgs) -> anyhow::Result<()> {
    let service = super::bootstrap().await?;
    let shops: Vec<Shop> = super::read_json(&args.file).await?;

    let inserted = service.seed(shops).await?;
    info!(inserted, path = %args.file.display(), "Seeded shops");
    println!("{}", inserted);

    Ok(())
}
