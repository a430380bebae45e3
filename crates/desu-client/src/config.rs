//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use desu_store::DEFAULT_AUTOSAVE_INTERVAL;

/// Default backing file of the client directory.
pub const DEFAULT_STORAGE: &str = ".client-data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backing file of the server directory.
    pub storage: PathBuf,
    pub autosave_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            storage: PathBuf::from(DEFAULT_STORAGE),
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Default settings over the given backing file.
    pub fn at(storage: impl Into<PathBuf>) -> Self {
        Self {
            storage: storage.into(),
            ..Self::default()
        }
    }
}
