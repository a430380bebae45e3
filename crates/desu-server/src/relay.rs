//! In-process relay over a message ledger.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use desu_core::protocol::{ListQuery, NewMessage, ServerInfo, StoredMessage, SubmitReceipt};
use desu_core::traits::Relay;
use desu_core::types::ServerUrl;
use desu_core::Result;
use desu_store::MessageLedger;

use crate::config::ServerConfig;

/// Answers relay calls straight from a ledger, without a socket.
///
/// The HTTP routes are thin wrappers over this type.
#[derive(Debug, Clone)]
pub struct LocalRelay {
    url: ServerUrl,
    ledger: MessageLedger,
    config: Arc<ServerConfig>,
}

impl LocalRelay {
    pub fn new(url: ServerUrl, ledger: MessageLedger, config: Arc<ServerConfig>) -> Self {
        Self {
            url,
            ledger,
            config,
        }
    }

    pub fn ledger(&self) -> &MessageLedger {
        &self.ledger
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[async_trait]
impl Relay for LocalRelay {
    fn url(&self) -> &ServerUrl {
        &self.url
    }

    async fn info(&self) -> Result<ServerInfo> {
        Ok(self.config.info(self.ledger.now()))
    }

    #[instrument(skip(self, message), fields(url = %self.url))]
    async fn post(&self, message: NewMessage) -> Result<SubmitReceipt> {
        debug!("Submitting message");
        self.ledger.submit_message(message)
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn list(&self, query: &ListQuery) -> Result<Vec<StoredMessage>> {
        debug!("Listing messages");
        self.ledger.list(query)
    }
}
