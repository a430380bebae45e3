//! desu-core - Core relay types and traits.

pub mod error;
pub mod protocol;
pub mod record;
pub mod traits;
pub mod types;

pub use error::{Error, StoreError};
pub use protocol::{
    ListQuery, MessageList, NewMessage, PROTOCOL_VERSION, ServerInfo, StoredMessage, SubmitReceipt,
};
pub use record::{Filter, Predicate, Query, Record, RecordId, Window};
pub use traits::Relay;
pub use types::ServerUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
