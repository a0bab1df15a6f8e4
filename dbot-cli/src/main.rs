//! dbot: community chat bot with long-term per-user conversation context.

use anyhow::Result;
use clap::Parser;
use dbot_cli::{commands, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    commands::dispatch(cli.command).await
}
