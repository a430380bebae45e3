//! desu-store - Embedded record store and its relay specializations.
//!
//! [`FileStore`] is a collection-oriented record store kept in memory and
//! persisted as one JSON document. [`MessageLedger`] builds the server's
//! message log on it; [`ServerDirectory`] builds the client's view of known
//! servers, channels, and fetched messages.

mod autosave;
mod clock;
mod collection;
pub mod directory;
pub mod ledger;
mod store;

pub use autosave::{AutosaveHandle, DEFAULT_AUTOSAVE_INTERVAL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::{Channel, ChannelMessage, ServerDirectory, ServerEntry};
pub use ledger::MessageLedger;
pub use store::{CollectionSpec, FileStore};
