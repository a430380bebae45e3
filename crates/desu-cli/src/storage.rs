//! Where the client directory lives on disk.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use directories::ProjectDirs;

use desu_client::{Client, ClientConfig};
use desu_core::ServerUrl;

/// Options shared by commands that use the local server directory.
#[derive(Args, Debug, Clone)]
pub struct DirectoryArgs {
    /// Client directory file (defaults to the platform data directory)
    #[arg(long, env = "DESU_CLIENT_DATA")]
    pub data: Option<PathBuf>,
}

impl DirectoryArgs {
    /// The directory file to use, creating its parent if needed.
    pub fn path(&self) -> Result<PathBuf> {
        let path = match &self.data {
            Some(path) => path.clone(),
            None => default_path()?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
        Ok(path)
    }

    /// Open the client over the directory file.
    pub fn open(&self) -> Result<Client> {
        let path = self.path()?;
        Client::open(ClientConfig::at(&path))
            .with_context(|| format!("Failed to open client directory {}", path.display()))
    }
}

/// `<data dir>/desu/client.json`.
fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "desu").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("client.json"))
}

/// Parse a relay base URL argument.
pub fn server_url(value: &str) -> Result<ServerUrl> {
    ServerUrl::new(value).with_context(|| format!("Invalid server URL '{value}'"))
}
