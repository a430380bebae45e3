//! Client-side directory of known relay servers, their channels, and the
//! messages fetched from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use desu_core::Result;
use desu_core::protocol::PROTOCOL_VERSION;
use desu_core::record::{Filter, Predicate, Query, Record, RecordId, Window};
use desu_core::types::ServerUrl;

use crate::store::{CollectionSpec, FileStore};

pub const SERVERS: &str = "servers";
pub const CHANNELS: &str = "channels";
pub const MESSAGES: &str = "messages";

/// Name recorded for a server whose `/info` carries no usable name.
pub const DEFAULT_SERVER_NAME: &str = "Unnamed Server";

/// Icon recorded for a server whose `/info` carries no usable icon.
pub const DEFAULT_SERVER_ICON: &str = "https://www.rioki.org/favicon.ico";

/// A known relay server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub url: String,
    pub name: String,
    pub icon: String,
    pub lifetime: u64,
    pub version: u32,
}

impl ServerEntry {
    /// Build an entry from a raw `/info` answer, repairing anything missing
    /// or malformed with defaults instead of rejecting it.
    pub fn from_info(url: &ServerUrl, info: &Value) -> Self {
        let version = info
            .get("version")
            .and_then(Value::as_u64)
            .filter(|v| *v > 0)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(PROTOCOL_VERSION);

        let name = info
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SERVER_NAME)
            .to_string();

        let icon = info
            .get("icon")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SERVER_ICON)
            .to_string();

        let lifetime = info.get("lifetime").and_then(Value::as_u64).unwrap_or(0);

        Self {
            url: url.as_str().to_string(),
            name,
            icon,
            lifetime,
            version,
        }
    }
}

/// A channel scoped to one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub server: RecordId,
    pub name: String,
}

/// A message stored under a (server, channel) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub server: RecordId,
    pub channel: RecordId,
    #[serde(rename = "postDate")]
    pub post_date: i64,
    pub body: Value,
}

/// Tracks known servers and their channels/messages on top of a [`FileStore`].
#[derive(Debug, Clone)]
pub struct ServerDirectory {
    store: FileStore,
}

impl ServerDirectory {
    /// Collections the directory needs declared on its store.
    pub fn collections() -> Vec<CollectionSpec> {
        vec![
            CollectionSpec::new(SERVERS).index("url"),
            CollectionSpec::new(CHANNELS).index("server"),
            CollectionSpec::new(MESSAGES).index("server").index("channel"),
        ]
    }

    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Record a server. Uniqueness by url is the caller's job; see
    /// [`ServerDirectory::get_server`].
    #[instrument(skip(self), fields(url = %entry.url))]
    pub fn add_server(&self, entry: ServerEntry) -> Result<Record<ServerEntry>> {
        let record = self.store.insert(SERVERS, entry)?;
        debug!(id = %record.id, "Added server");
        Ok(record)
    }

    /// The first server registered under `url`.
    pub fn get_server(&self, url: &ServerUrl) -> Result<Option<Record<ServerEntry>>> {
        self.store
            .find_one(SERVERS, &Filter::eq("url", url.as_str()).into())
    }

    /// Every known server in registration order.
    pub fn get_servers(&self) -> Result<Vec<Record<ServerEntry>>> {
        self.store
            .query(SERVERS, &Query::default().window(Window::unbounded()))
    }

    /// Create a channel under `server`.
    #[instrument(skip(self, server), fields(server = %server.id))]
    pub fn add_channel(&self, server: &Record<ServerEntry>, name: &str) -> Result<Record<Channel>> {
        let channel = Channel {
            server: server.id,
            name: name.to_string(),
        };
        self.store.insert(CHANNELS, channel)
    }

    /// Channels of `server`, sorted by name.
    pub fn get_channels(&self, server: &Record<ServerEntry>) -> Result<Vec<Record<Channel>>> {
        let query = Query::new(Filter::eq("server", server.id))
            .sort_by("name")
            .window(Window::unbounded());
        self.store.query(CHANNELS, &query)
    }

    /// The first channel of `server` called `name`.
    pub fn find_channel(
        &self,
        server: &Record<ServerEntry>,
        name: &str,
    ) -> Result<Option<Record<Channel>>> {
        let predicate = Predicate::all()
            .and(Filter::eq("server", server.id))
            .and(Filter::eq("name", name));
        self.store.find_one(CHANNELS, &predicate)
    }

    /// Store a message under `(server, channel)`.
    #[instrument(skip(self, server, channel, body), fields(server = %server.id, channel = %channel.id))]
    pub fn add_message(
        &self,
        server: &Record<ServerEntry>,
        channel: &Record<Channel>,
        post_date: i64,
        body: Value,
    ) -> Result<Record<ChannelMessage>> {
        let message = ChannelMessage {
            server: server.id,
            channel: channel.id,
            post_date,
            body,
        };
        self.store.insert(MESSAGES, message)
    }

    fn scope(server: &Record<ServerEntry>, channel: &Record<Channel>) -> Predicate {
        Predicate::all()
            .and(Filter::eq("server", server.id))
            .and(Filter::eq("channel", channel.id))
    }

    /// Messages of `(server, channel)` sorted by post date, paginated.
    pub fn get_messages(
        &self,
        server: &Record<ServerEntry>,
        channel: &Record<Channel>,
        window: Window,
    ) -> Result<Vec<Record<ChannelMessage>>> {
        let query = Query::new(Self::scope(server, channel))
            .sort_by("postDate")
            .window(window);
        self.store.query(MESSAGES, &query)
    }

    /// Post date of the newest stored message in `(server, channel)`.
    pub fn latest_post_date(
        &self,
        server: &Record<ServerEntry>,
        channel: &Record<Channel>,
    ) -> Result<Option<i64>> {
        let all = self.get_messages(server, channel, Window::unbounded())?;
        Ok(all.last().map(|m| m.data.post_date))
    }
}
