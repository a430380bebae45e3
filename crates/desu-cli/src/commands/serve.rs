//! Serve command implementation.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use desu_server::config::{
    DEFAULT_ICON, DEFAULT_LIFETIME, DEFAULT_NAME, DEFAULT_PORT, DEFAULT_PRUNE_INTERVAL,
    DEFAULT_STORAGE,
};
use desu_server::{Server, ServerConfig};

use crate::output;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Message store file
    #[arg(long, env = "DESU_STORAGE", default_value = DEFAULT_STORAGE)]
    pub storage: PathBuf,

    /// Address to listen on
    #[arg(long, env = "DESU_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on (0 picks a free one)
    #[arg(long, env = "DESU_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Path prefix to mount the routes under
    #[arg(long, env = "DESU_PREFIX", default_value = "")]
    pub prefix: String,

    /// Message lifetime in milliseconds (0 keeps messages forever)
    #[arg(long, env = "DESU_LIFETIME", default_value_t = DEFAULT_LIFETIME)]
    pub lifetime: u64,

    /// Server name reported by /info
    #[arg(long, env = "DESU_NAME", default_value = DEFAULT_NAME)]
    pub name: String,

    /// Server icon URL reported by /info
    #[arg(long, env = "DESU_ICON", default_value = DEFAULT_ICON)]
    pub icon: String,

    /// Seconds between two pruning passes
    #[arg(long, env = "DESU_PRUNE_INTERVAL", default_value_t = DEFAULT_PRUNE_INTERVAL.as_secs())]
    pub prune_interval: u64,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        ServerConfig {
            storage: args.storage,
            host: args.host,
            port: args.port,
            prefix: args.prefix,
            lifetime: args.lifetime,
            name: args.name,
            icon: args.icon,
            prune_interval: Duration::from_secs(args.prune_interval.max(1)),
            ..ServerConfig::default()
        }
    }
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::from(args);
    let storage = config.storage.clone();
    debug!(?config, "Resolved server configuration");

    let server = Server::start(config)
        .await
        .with_context(|| format!("Failed to start server on {}", storage.display()))?;

    output::success(&format!("Listening on {}", server.url()));
    output::note("Press Ctrl+C to stop.");

    server
        .run_until_ctrl_c()
        .await
        .context("Server stopped with an error")
}
