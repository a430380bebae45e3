//! Core traits for relay behavior.

mod relay;

pub use relay::Relay;
