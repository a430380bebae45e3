//! Error types for the desu crates.
//!
//! This module provides a unified error type with explicit variants for
//! storage, transport, protocol, and input validation errors.

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type for desu operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Record store errors (I/O, corrupt document, lock contention).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Protocol errors (unexpected status, non-JSON responses).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (invalid URL, malformed body).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Errors raised by the embedded record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backing file exists but is not a valid store document.
    #[error("corrupt store file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Another process holds the store lock.
    #[error("store {path} is locked by another process")]
    Locked { path: PathBuf },

    /// The collection was not declared when the store was opened.
    #[error("unknown collection '{name}'")]
    UnknownCollection { name: String },
}

impl StoreError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Protocol-level errors from a remote relay.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The remote answered with something other than 200.
    #[error("{method} {url} returned {status}")]
    UnexpectedStatus {
        method: &'static str,
        url: String,
        status: u16,
    },

    /// The remote answered without a JSON content type.
    #[error("{method} {url} is not JSON (content-type: {content_type})")]
    NotJson {
        method: &'static str,
        url: String,
        content_type: String,
    },

    /// The body claimed to be JSON but did not decode.
    #[error("{method} {url} returned an undecodable body: {message}")]
    Decode {
        method: &'static str,
        url: String,
        message: String,
    },
}

impl ProtocolError {
    /// HTTP status of the failed request, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProtocolError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid server URL.
    #[error("invalid server URL '{value}': {reason}")]
    ServerUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
