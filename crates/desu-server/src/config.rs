//! Server configuration.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use desu_core::protocol::{PROTOCOL_VERSION, ServerInfo};
use desu_store::DEFAULT_AUTOSAVE_INTERVAL;

pub const DEFAULT_STORAGE: &str = ".server-data";
pub const DEFAULT_PORT: u16 = 9350;
/// One week, in milliseconds.
pub const DEFAULT_LIFETIME: u64 = 604_800_000;
pub const DEFAULT_NAME: &str = "A Desu Server";
pub const DEFAULT_ICON: &str = "https://www.rioki.org/favicon.ico";
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(30);

/// Everything a server needs, resolved before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Backing file of the message store.
    pub storage: PathBuf,
    pub host: IpAddr,
    /// Port to listen on; 0 picks a free one.
    pub port: u16,
    /// Path prefix every route is mounted under, e.g. `/desu`.
    pub prefix: String,
    /// Message retention in milliseconds; 0 disables pruning.
    pub lifetime: u64,
    pub name: String,
    pub icon: String,
    pub prune_interval: Duration,
    pub autosave_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            storage: PathBuf::from(DEFAULT_STORAGE),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            prefix: String::new(),
            lifetime: DEFAULT_LIFETIME,
            name: DEFAULT_NAME.to_string(),
            icon: DEFAULT_ICON.to_string(),
            prune_interval: DEFAULT_PRUNE_INTERVAL,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// The prefix as a route path: empty, or `/segment` without a trailing slash.
    pub fn route_prefix(&self) -> String {
        let trimmed = self.prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// The `/info` answer at time `now`.
    pub fn info(&self, now: i64) -> ServerInfo {
        ServerInfo {
            version: PROTOCOL_VERSION,
            name: self.name.clone(),
            icon: self.icon.clone(),
            lifetime: self.lifetime,
            time: now,
        }
    }
}
