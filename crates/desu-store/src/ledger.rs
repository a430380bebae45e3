//! Server-side message ledger.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use desu_core::Result;
use desu_core::protocol::{ListQuery, NewMessage, StoredMessage, SubmitReceipt};
use desu_core::record::{Filter, Predicate, Query};

use crate::clock::{Clock, SystemClock};
use crate::store::{CollectionSpec, FileStore};

/// Collection holding relayed messages.
pub const MESSAGES: &str = "messages";

/// Field stamped with the receive time.
const RECEIVED: &str = "received";

/// Field assigned by the ledger and stripped from posted messages.
const ID: &str = "id";

/// Payload stored per message: the posted object plus its receive time.
/// The id lives in the record envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerEntry {
    #[serde(default)]
    body: Value,
    received: i64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Stamps, stores, lists, and prunes relayed messages.
#[derive(Debug, Clone)]
pub struct MessageLedger {
    store: FileStore,
    clock: Arc<dyn Clock>,
    /// Last stamp handed out. Held across stamp and insert so id order and
    /// `received` order agree.
    last_received: Arc<Mutex<i64>>,
}

impl MessageLedger {
    /// Collections the ledger needs declared on its store.
    pub fn collections() -> Vec<CollectionSpec> {
        vec![CollectionSpec::new(MESSAGES).index(RECEIVED)]
    }

    /// Ledger over `store`, stamping with the wall clock.
    pub fn new(store: FileStore) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: FileStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            last_received: Arc::new(Mutex::new(i64::MIN)),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Current time as the ledger sees it.
    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Store a message carrying only `body`.
    pub fn submit(&self, body: Value) -> Result<SubmitReceipt> {
        self.submit_message(NewMessage::new(body))
    }

    /// Stamp `message` with the receive time and store it whole. Sender
    /// supplied `id` and `received` fields are replaced.
    #[instrument(skip_all)]
    pub fn submit_message(&self, message: NewMessage) -> Result<SubmitReceipt> {
        let NewMessage { body, mut extra } = message;
        extra.remove(ID);
        extra.remove(RECEIVED);

        // The clock never goes backwards within this process, and the next
        // stamp waits until this insert has taken its id.
        let mut last = self
            .last_received
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let received = self.clock.now_millis().max(*last);
        let record = self.store.insert(
            MESSAGES,
            LedgerEntry {
                body,
                received,
                extra,
            },
        )?;
        *last = received;
        drop(last);
        debug!(id = %record.id, received, "Accepted message");

        Ok(SubmitReceipt {
            id: record.id,
            submitted: true,
            received,
        })
    }

    /// Messages with `received >= min_time`, oldest first, paginated.
    #[instrument(skip(self))]
    pub fn list(&self, query: &ListQuery) -> Result<Vec<StoredMessage>> {
        let query = Query::new(Filter::gte(RECEIVED, query.min_time))
            .sort_by(RECEIVED)
            .window(query.window());

        let records = self.store.query::<LedgerEntry>(MESSAGES, &query)?;
        Ok(records
            .into_iter()
            .map(|record| StoredMessage {
                id: record.id,
                body: record.data.body,
                received: record.data.received,
                extra: record.data.extra,
            })
            .collect())
    }

    /// Delete every message received before `cutoff`.
    #[instrument(skip(self))]
    pub fn prune(&self, cutoff: i64) -> Result<usize> {
        let predicate = Predicate::from(Filter::lt(RECEIVED, cutoff));
        let removed = self.store.delete_where(MESSAGES, &predicate)?;
        if removed > 0 {
            info!(removed, cutoff, "Pruned expired messages");
        }
        Ok(removed)
    }

    /// Prune messages older than `lifetime` milliseconds. A lifetime of 0
    /// keeps everything.
    pub fn prune_expired(&self, lifetime: u64) -> Result<usize> {
        if lifetime == 0 {
            return Ok(0);
        }
        let lifetime = i64::try_from(lifetime).unwrap_or(i64::MAX);
        self.prune(self.now().saturating_sub(lifetime))
    }

    /// Number of stored messages.
    pub fn len(&self) -> Result<usize> {
        self.store.count(MESSAGES)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every message and restart ids. Test isolation only.
    pub fn reset(&self) -> Result<()> {
        self.store.reset(MESSAGES)
    }
}
