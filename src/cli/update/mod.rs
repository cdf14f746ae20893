//! Update command - writes a shop and drops its cache entry

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::domain::shop::Shop;

/// Arguments for the update command
#[derive(Args, Clone)]
pub struct UpdateArgs {
    /// JSON document holding the full shop, including its id
    #[arg(long)]
    pub file: PathBuf,
}

pub async fn run(args: UpdateArgs) -> anyhow::Result<()> {
    let service = super::bootstrap().await?;
    let shop: Shop = super::read_json(&args.file).await?;

    service.update_shop(&shop).await?;
    info!(path = %args.file.display(), "Shop updated");

    Ok(())
}
