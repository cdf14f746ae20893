//! Get command - reads one shop through the cache

use clap::Args;

use crate::domain::shop::ShopId;
use crate::domain::DomainError;

/// Arguments for the get command
#[derive(Args, Clone)]
pub struct GetArgs {
    /// Shop id
    pub id: ShopId,
}

/// Prints the shop as JSON, or the not-found message
pub async fn run(args: GetArgs) -> anyhow::Result<()> {
    let service = super::bootstrap().await?;

    match service.query_shop_by_id(args.id).await {
        Ok(shop) => {
            println!("{}", serde_json::to_string_pretty(&shop)?);
            Ok(())
        }
        Err(DomainError::NotFound { message }) => {
            println!("{}", message);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
