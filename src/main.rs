use clap::Parser;
use shop_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Get(args) => cli::get::run(args).await,
        Command::Update(args) => cli::update::run(args).await,
        Command::Seed(args) => cli::seed::run(args).await,
    }
}
