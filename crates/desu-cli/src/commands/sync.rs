//! Sync command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::storage::{self, DirectoryArgs};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Relay base URL
    pub url: String,

    /// Local channel to store the messages under
    #[arg(long, default_value = "general")]
    pub channel: String,

    #[command(flatten)]
    pub directory: DirectoryArgs,
}

pub async fn run(args: SyncArgs) -> Result<()> {
    let url = storage::server_url(&args.url)?;
    let client = args.directory.open()?;

    let server = client
        .connect(&url)
        .await
        .with_context(|| format!("Failed to connect to {url}"))?;
    let stored = client
        .sync_channel(&server, &args.channel)
        .await
        .with_context(|| format!("Failed to sync from {url}"))?;

    output::success(&format!(
        "Synced {stored} new message(s) into '{}'",
        args.channel
    ));

    client.close().await.context("Failed to save client directory")
}
