//! Info command implementation.

use anyhow::{Context, Result};
use clap::Args;

use desu_client::HttpRelay;

use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Relay base URL
    pub url: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: InfoArgs) -> Result<()> {
    let url = storage::server_url(&args.url)?;
    let relay = HttpRelay::new(url.clone())?;

    let info = relay
        .fetch_info()
        .await
        .with_context(|| format!("Failed to fetch info from {url}"))?;

    output::json_as(&info, args.pretty)
}
