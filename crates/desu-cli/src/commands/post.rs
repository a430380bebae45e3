//! Post command implementation.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use desu_client::HttpRelay;
use desu_core::Relay;

use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct PostArgs {
    /// Relay base URL
    pub url: String,

    /// Message body: JSON, or plain text sent as a JSON string
    pub body: String,

    /// Output the receipt as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON if it parses, otherwise the raw text as a string.
fn parse_body(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub async fn run(args: PostArgs) -> Result<()> {
    let url = storage::server_url(&args.url)?;
    let relay = HttpRelay::new(url.clone())?;

    let receipt = relay
        .submit(parse_body(&args.body))
        .await
        .with_context(|| format!("Failed to post to {url}"))?;

    if args.json {
        output::json(&receipt)?;
    } else {
        output::success("Message posted");
        output::field("ID", &receipt.id.to_string());
        output::field("Received", &output::timestamp(receipt.received));
    }

    Ok(())
}
