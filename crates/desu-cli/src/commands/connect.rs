//! Connect command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::storage::{self, DirectoryArgs};

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Relay base URL
    pub url: String,

    #[command(flatten)]
    pub directory: DirectoryArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ConnectArgs) -> Result<()> {
    let url = storage::server_url(&args.url)?;
    let client = args.directory.open()?;

    let server = client
        .connect(&url)
        .await
        .with_context(|| format!("Failed to connect to {url}"))?;

    if args.json {
        output::json(&server)?;
    } else {
        output::success(&format!("Connected to {}", server.data.name));
        output::server(&server);
    }

    client.close().await.context("Failed to save client directory")
}
