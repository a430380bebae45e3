//! Watch command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use futures_util::StreamExt;

use desu_client::{HttpRelay, subscribe};

use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Relay base URL
    pub url: String,

    /// Start from this receive time (epoch ms; defaults to now)
    #[arg(long)]
    pub since: Option<i64>,

    /// Milliseconds between two polls
    #[arg(long, default_value_t = 1000)]
    pub interval: u64,

    /// Output messages as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: WatchArgs) -> Result<()> {
    let url = storage::server_url(&args.url)?;
    let relay = Arc::new(HttpRelay::new(url)?);

    let since = args
        .since
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let interval = Duration::from_millis(args.interval.max(1));

    output::note("Watching for messages...");
    output::note("Press Ctrl+C to stop.");

    let mut stream = subscribe(relay, since, interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                output::note("Stopped.");
                return Ok(());
            }
            next = stream.next() => {
                match next {
                    Some(Ok(message)) => {
                        if args.json {
                            output::json(&message)?;
                        } else {
                            println!(
                                "{} {} {}",
                                output::timestamp(message.received).as_str().dimmed(),
                                format!("#{}", message.id).as_str().cyan(),
                                message.body
                            );
                        }
                    }
                    Some(Err(e)) => eprintln!("{} {}", "Poll failed:".red(), e),
                    None => return Ok(()),
                }
            }
        }
    }
}
