//! Stored record types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned record identifier.
///
/// Unique within a collection, strictly increasing in insertion order, and
/// never reused, not even after the record it named has been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// The first id handed out by an empty collection.
    pub const FIRST: RecordId = RecordId(1);

    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id following this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RecordId> for serde_json::Value {
    fn from(id: RecordId) -> Self {
        serde_json::Value::from(id.0)
    }
}

/// A record read back from (or just written to) the store.
///
/// The id lives in the envelope, never inside `data`, so the payload a caller
/// inserted is exactly the payload it reads back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    /// The store-assigned id.
    pub id: RecordId,

    /// The caller's payload.
    pub data: T,
}

impl<T> Record<T> {
    /// Build a record envelope.
    pub fn new(id: RecordId, data: T) -> Self {
        Self { id, data }
    }

    /// Map the payload, keeping the id.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Record<U> {
        Record {
            id: self.id,
            data: f(self.data),
        }
    }
}
