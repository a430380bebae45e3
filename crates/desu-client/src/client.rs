//! The client: a directory of known relays plus the calls that fill it.

use tracing::{debug, info, instrument};

use desu_core::error::StoreError;
use desu_core::record::{Record, Window};
use desu_core::traits::Relay;
use desu_core::types::ServerUrl;
use desu_core::Result;
use desu_store::{AutosaveHandle, Channel, ChannelMessage, FileStore, ServerDirectory, ServerEntry};

use crate::config::ClientConfig;
use crate::cursor::Cursor;
use crate::http::{HttpRelay, http_client};

/// Client-side state over a [`ServerDirectory`].
///
/// # Example
///
/// ```no_run
/// use desu_client::{Client, ClientConfig};
/// use desu_core::{ServerUrl, Window};
///
/// # async fn example() -> desu_core::Result<()> {
/// let client = Client::open(ClientConfig::at("client.json"))?;
/// let server = client.connect(&ServerUrl::new("http://localhost:9350")?).await?;
///
/// client.sync_channel(&server, "general").await?;
/// for message in client.messages(&server, "general", Window::default())? {
///     println!("{}", message.data.body);
/// }
///
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client {
    directory: ServerDirectory,
    autosave: Option<AutosaveHandle>,
    http: reqwest::Client,
}

impl Client {
    /// Open the directory at `config.storage` and start autosaving it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let store = FileStore::open(&config.storage, ServerDirectory::collections())?;
        let autosave = store.spawn_autosave(config.autosave_interval);
        Ok(Self {
            directory: ServerDirectory::new(store),
            autosave: Some(autosave),
            http: http_client()?,
        })
    }

    /// A client whose directory lives only in memory.
    pub fn memory() -> Result<Self> {
        Ok(Self {
            directory: ServerDirectory::new(FileStore::memory(ServerDirectory::collections())),
            autosave: None,
            http: http_client()?,
        })
    }

    pub fn directory(&self) -> &ServerDirectory {
        &self.directory
    }

    /// Register the relay at `url`, asking it for `/info` only if it is not
    /// known yet. Missing or malformed metadata is replaced by defaults.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn connect(&self, url: &ServerUrl) -> Result<Record<ServerEntry>> {
        if let Some(known) = self.directory.get_server(url)? {
            debug!(id = %known.id, "Server already known");
            return Ok(known);
        }

        let info = self.relay_at(url.clone()).fetch_info().await?;
        self.register(url, &info)
    }

    /// Like [`Client::connect`], over any relay implementation.
    #[instrument(skip(self, relay), fields(url = %relay.url()))]
    pub async fn connect_with<R: Relay + ?Sized>(&self, relay: &R) -> Result<Record<ServerEntry>> {
        if let Some(known) = self.directory.get_server(relay.url())? {
            return Ok(known);
        }

        let info = relay.info().await?;
        let info = serde_json::to_value(info).map_err(StoreError::from)?;
        self.register(relay.url(), &info)
    }

    fn register(&self, url: &ServerUrl, info: &serde_json::Value) -> Result<Record<ServerEntry>> {
        let entry = ServerEntry::from_info(url, info);
        let record = self.directory.add_server(entry)?;
        info!(id = %record.id, name = %record.data.name, "Connected to server");
        Ok(record)
    }

    /// Every known server in registration order.
    pub fn get_servers(&self) -> Result<Vec<Record<ServerEntry>>> {
        self.directory.get_servers()
    }

    pub fn get_server(&self, url: &ServerUrl) -> Result<Option<Record<ServerEntry>>> {
        self.directory.get_server(url)
    }

    /// An HTTP relay for a known server.
    pub fn relay(&self, server: &Record<ServerEntry>) -> Result<HttpRelay> {
        Ok(self.relay_at(ServerUrl::new(&server.data.url)?))
    }

    fn relay_at(&self, url: ServerUrl) -> HttpRelay {
        HttpRelay::with_client(url, self.http.clone())
    }

    fn channel(&self, server: &Record<ServerEntry>, name: &str) -> Result<Record<Channel>> {
        match self.directory.find_channel(server, name)? {
            Some(channel) => Ok(channel),
            None => self.directory.add_channel(server, name),
        }
    }

    /// Pull messages the server received since the last sync into `channel`.
    /// Returns how many were stored.
    pub async fn sync_channel(&self, server: &Record<ServerEntry>, channel: &str) -> Result<usize> {
        let relay = self.relay(server)?;
        self.sync_channel_from(&relay, server, channel).await
    }

    /// Like [`Client::sync_channel`], over any relay implementation.
    ///
    /// Messages are stored with `postDate` set to the server's receive time.
    /// Anything received at the same millisecond as the newest stored message
    /// is compared by body so it is neither lost nor stored twice.
    #[instrument(skip(self, relay, server), fields(server = %server.id))]
    pub async fn sync_channel_from<R: Relay + ?Sized>(
        &self,
        relay: &R,
        server: &Record<ServerEntry>,
        channel: &str,
    ) -> Result<usize> {
        let channel = self.channel(server, channel)?;
        let latest = self.directory.latest_post_date(server, &channel)?;

        let mut seen_at_latest: Vec<serde_json::Value> = match latest {
            Some(latest) => self
                .directory
                .get_messages(server, &channel, Window::unbounded())?
                .into_iter()
                .filter(|m| m.data.post_date == latest)
                .map(|m| m.data.body)
                .collect(),
            None => Vec::new(),
        };

        let incoming = Cursor::new(latest.unwrap_or(0)).fetch(relay).await?;
        let mut stored = 0;
        for message in incoming {
            if Some(message.received) == latest {
                if let Some(pos) = seen_at_latest.iter().position(|b| *b == message.body) {
                    seen_at_latest.swap_remove(pos);
                    continue;
                }
            }
            self.directory
                .add_message(server, &channel, message.received, message.body)?;
            stored += 1;
        }

        debug!(stored, "Synced channel");
        Ok(stored)
    }

    /// Stored messages of `channel`, oldest first. An unknown channel has
    /// no messages.
    pub fn messages(
        &self,
        server: &Record<ServerEntry>,
        channel: &str,
        window: Window,
    ) -> Result<Vec<Record<ChannelMessage>>> {
        match self.directory.find_channel(server, channel)? {
            Some(channel) => self.directory.get_messages(server, &channel, window),
            None => Ok(Vec::new()),
        }
    }

    /// Stop autosaving and flush the directory.
    pub async fn close(mut self) -> Result<()> {
        if let Some(autosave) = self.autosave.take() {
            autosave.shutdown().await?;
        }
        Ok(())
    }
}
