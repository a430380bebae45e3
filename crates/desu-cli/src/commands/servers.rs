//! Servers command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::storage::DirectoryArgs;

#[derive(Args, Debug)]
pub struct ServersArgs {
    #[command(flatten)]
    pub directory: DirectoryArgs,

    /// Output one JSON object per server
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ServersArgs) -> Result<()> {
    let client = args.directory.open()?;
    let servers = client.get_servers().context("Failed to read servers")?;

    if servers.is_empty() {
        output::note("No servers known. Run 'desu connect <url>' first.");
    }

    for (i, server) in servers.iter().enumerate() {
        if args.json {
            output::json(server)?;
        } else {
            if i > 0 {
                println!();
            }
            output::server(server);
        }
    }

    client.close().await.context("Failed to save client directory")
}
