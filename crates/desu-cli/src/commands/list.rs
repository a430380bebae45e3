//! List command implementation.

use anyhow::{Context, Result};
use clap::Args;

use desu_client::HttpRelay;
use desu_core::record::DEFAULT_LIMIT;
use desu_core::{ListQuery, Relay};

use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Relay base URL
    pub url: String,

    /// Only messages received at or after this time (epoch ms)
    #[arg(long, default_value_t = 0)]
    pub min_time: i64,

    /// Number of messages to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Maximum number of messages to return
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: ListArgs) -> Result<()> {
    let url = storage::server_url(&args.url)?;
    let relay = HttpRelay::new(url.clone())?;

    let query = ListQuery::since(args.min_time)
        .with_offset(args.offset)
        .with_limit(args.limit);
    let messages = relay
        .list(&query)
        .await
        .with_context(|| format!("Failed to list messages on {url}"))?;

    if messages.is_empty() {
        output::note("No messages found.");
        return Ok(());
    }

    for message in &messages {
        output::json_as(message, args.pretty)?;
    }

    Ok(())
}
