//! Messages command implementation.

use anyhow::{Context, Result};
use clap::Args;

use desu_core::Window;
use desu_core::record::DEFAULT_LIMIT;

use crate::output;
use crate::storage::{self, DirectoryArgs};

#[derive(Args, Debug)]
pub struct MessagesArgs {
    /// Relay base URL
    pub url: String,

    /// Local channel to read
    #[arg(long, default_value = "general")]
    pub channel: String,

    /// Number of messages to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Maximum number of messages to show
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    #[command(flatten)]
    pub directory: DirectoryArgs,
}

pub async fn run(args: MessagesArgs) -> Result<()> {
    let url = storage::server_url(&args.url)?;
    let client = args.directory.open()?;

    let server = client
        .get_server(&url)
        .context("Failed to read servers")?
        .with_context(|| format!("Unknown server {url}. Run 'desu connect {url}' first."))?;

    let messages = client
        .messages(&server, &args.channel, Window::new(args.offset, args.limit))
        .context("Failed to read messages")?;

    if messages.is_empty() {
        output::note("No messages found.");
    }
    for message in &messages {
        output::json(&message.data)?;
    }

    client.close().await.context("Failed to save client directory")
}
