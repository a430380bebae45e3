//! In-memory relay for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use desu_core::Result;
use desu_core::protocol::{ListQuery, NewMessage, ServerInfo, StoredMessage, SubmitReceipt};
use desu_core::record::RecordId;
use desu_core::traits::Relay;
use desu_core::types::ServerUrl;

/// Relay over a vector kept in receive order, like the server lists it.
#[derive(Debug)]
pub(crate) struct FakeRelay {
    url: ServerUrl,
    messages: Mutex<Vec<StoredMessage>>,
    /// Oldest messages dropped after every `list`, as a pruning server would.
    prune_per_list: usize,
}

impl FakeRelay {
    pub(crate) fn new() -> Self {
        Self {
            url: ServerUrl::new("http://fake.example").unwrap(),
            messages: Mutex::new(Vec::new()),
            prune_per_list: 0,
        }
    }

    pub(crate) fn pruning_after_list(mut self, count: usize) -> Self {
        self.prune_per_list = count;
        self
    }

    pub(crate) fn push(&self, body: Value, received: i64) {
        let id = {
            let messages = self.messages.lock().unwrap();
            let max = messages.iter().map(|m| m.id.get()).max().unwrap_or(0);
            RecordId::new(max + 1)
        };
        self.push_with_id(id, body, received);
    }

    pub(crate) fn push_with_id(&self, id: RecordId, body: Value, received: i64) {
        let mut messages = self.messages.lock().unwrap();
        let at = messages.partition_point(|m| m.received <= received);
        messages.insert(at, StoredMessage::new(id, body, received));
    }
}

#[async_trait]
impl Relay for FakeRelay {
    fn url(&self) -> &ServerUrl {
        &self.url
    }

    async fn info(&self) -> Result<ServerInfo> {
        unimplemented!()
    }

    async fn post(&self, _message: NewMessage) -> Result<SubmitReceipt> {
        unimplemented!()
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<StoredMessage>> {
        let mut messages = self.messages.lock().unwrap();
        let page = messages
            .iter()
            .filter(|m| m.received >= query.min_time)
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();
        let pruned = self.prune_per_list.min(messages.len());
        messages.drain(..pruned);
        Ok(page)
    }
}
