//! Server error types.

use std::net::SocketAddr;

use thiserror::Error;

/// Fatal conditions while starting or stopping a server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The message store could not be opened or flushed, or the bound
    /// address did not form a valid server URL.
    #[error(transparent)]
    Relay(#[from] desu_core::Error),

    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
