//! Relay trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::protocol::{ListQuery, NewMessage, ServerInfo, StoredMessage, SubmitReceipt};
use crate::types::ServerUrl;

/// A message relay, reached over HTTP or in-process.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Returns the base URL this relay answers on.
    fn url(&self) -> &ServerUrl;

    /// Fetch the relay's self-description.
    async fn info(&self) -> Result<ServerInfo>;

    /// Post a message; every top-level field is stored.
    async fn post(&self, message: NewMessage) -> Result<SubmitReceipt>;

    /// Post a message carrying only `body`.
    async fn submit(&self, body: Value) -> Result<SubmitReceipt> {
        self.post(NewMessage::new(body)).await
    }

    /// List stored messages, oldest first.
    async fn list(&self, query: &ListQuery) -> Result<Vec<StoredMessage>>;
}
