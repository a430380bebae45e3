//! Read position in a relay's message log.

use std::collections::HashSet;

use desu_core::Result;
use desu_core::protocol::{ListQuery, StoredMessage};
use desu_core::record::{DEFAULT_LIMIT, RecordId};
use desu_core::traits::Relay;

/// A receive time plus the ids already returned at exactly that time.
///
/// Pages are requested by `minTime` rather than offset, so a prune on the
/// relay between two requests cannot move unseen messages out of reach.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    min_time: i64,
    seen: HashSet<RecordId>,
}

impl Cursor {
    /// Start at messages received at or after `min_time`.
    pub(crate) fn new(min_time: i64) -> Self {
        Self {
            min_time,
            seen: HashSet::new(),
        }
    }

    pub(crate) fn min_time(&self) -> i64 {
        self.min_time
    }

    /// Every message not returned before, oldest first, following pages
    /// until a short one comes back.
    pub(crate) async fn fetch<R: Relay + ?Sized>(&mut self, relay: &R) -> Result<Vec<StoredMessage>> {
        let mut out = Vec::new();

        loop {
            // Room for everything already seen at the boundary plus a full
            // page of new messages, so each full page moves forward.
            let limit = self.seen.len() + DEFAULT_LIMIT;
            let page = relay
                .list(&ListQuery::since(self.min_time).with_limit(limit))
                .await?;
            let full = page.len() >= limit;

            out.extend(page.into_iter().filter(|m| self.advance(m)));

            if !full {
                return Ok(out);
            }
        }
    }

    /// Move past `message`; false if it was already returned.
    fn advance(&mut self, message: &StoredMessage) -> bool {
        if message.received < self.min_time {
            return false;
        }
        if message.received > self.min_time {
            self.min_time = message.received;
            self.seen.clear();
        }
        self.seen.insert(message.id)
    }
}
