//! Wire types exchanged between relay servers and clients.
//!
//! All bodies are JSON. Timestamps are epoch milliseconds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{DEFAULT_LIMIT, RecordId, Window};

/// Protocol version reported by `GET /info`.
pub const PROTOCOL_VERSION: u32 = 1;

/// Self-description served by `GET /info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: u32,
    pub name: String,
    pub icon: String,
    /// Retention window in milliseconds; 0 means messages are kept forever.
    pub lifetime: u64,
    /// The server's clock when it answered.
    pub time: i64,
}

/// Body of `POST /`. Must be a JSON object; every top-level field is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    /// Opaque payload; the relay never looks inside.
    #[serde(default)]
    pub body: Value,
    /// Any other top-level fields the sender attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewMessage {
    pub fn new(body: impl Into<Value>) -> Self {
        Self {
            body: body.into(),
            extra: Map::new(),
        }
    }

    /// Attach an extra top-level field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Answer to `POST /`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub id: RecordId,
    pub submitted: bool,
    pub received: i64,
}

/// A message as served by `GET /`: the posted object plus `id` and
/// `received`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: RecordId,
    #[serde(default)]
    pub body: Value,
    pub received: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredMessage {
    pub fn new(id: RecordId, body: Value, received: i64) -> Self {
        Self {
            id,
            body,
            received,
            extra: Map::new(),
        }
    }
}

/// Answer to `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageList {
    pub messages: Vec<StoredMessage>,
}

/// Parameters of `GET /`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Only messages with `received >= min_time`.
    #[serde(rename = "minTime", default)]
    pub min_time: i64,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            min_time: 0,
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListQuery {
    /// Messages received at or after `min_time`, first page.
    pub fn since(min_time: i64) -> Self {
        Self {
            min_time,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// The pagination part of the query.
    pub fn window(&self) -> Window {
        Window::new(self.offset, self.limit)
    }
}
