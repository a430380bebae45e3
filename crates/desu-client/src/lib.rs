//! desu-client - Talk to desu relays and keep a local copy of what they say.
//!
//! [`HttpRelay`] speaks the relay protocol over HTTP. [`Client`] keeps a
//! [`ServerDirectory`](desu_store::ServerDirectory) of known servers and
//! syncs their messages into named channels. [`subscribe`] turns any relay
//! into a stream of new messages.

mod client;
mod config;
mod cursor;
mod http;
mod stream;
#[cfg(test)]
mod testing;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_STORAGE};
pub use http::{HttpRelay, USER_AGENT};
pub use stream::{DEFAULT_POLL_INTERVAL, MessageStream, subscribe};
