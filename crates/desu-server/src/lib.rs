//! desu-server - HTTP relay server.
//!
//! A relay accepts opaque JSON messages, stamps them with a receive time, and
//! serves them back in receive order until they expire.
//!
//! # Example
//!
//! ```no_run
//! use desu_server::{Server, ServerConfig};
//!
//! # async fn example() -> Result<(), desu_server::ServerError> {
//! let config = ServerConfig {
//!     port: 0,
//!     ..ServerConfig::default()
//! };
//! let server = Server::start(config).await?;
//! println!("listening on {}", server.url());
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
mod prune;
pub mod relay;
mod routes;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use desu_core::traits::Relay;
use desu_core::types::ServerUrl;
use desu_store::{AutosaveHandle, FileStore, MessageLedger};

pub use config::ServerConfig;
pub use error::ServerError;
pub use relay::LocalRelay;

use prune::Pruner;

/// A running relay server.
///
/// Dropping a `Server` aborts its background tasks without a final flush;
/// call [`Server::shutdown`] to stop cleanly.
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    relay: Arc<LocalRelay>,
    autosave: Option<AutosaveHandle>,
    pruner: Option<Pruner>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl Server {
    /// Open the message store at `config.storage` and start serving.
    pub async fn start(config: ServerConfig) -> Result<Self, ServerError> {
        let store = FileStore::open(&config.storage, MessageLedger::collections())?;
        Self::start_with_ledger(config, MessageLedger::new(store)).await
    }

    /// Start serving an already opened ledger.
    ///
    /// The socket is bound before any background task is spawned, so a bind
    /// failure leaves nothing running.
    #[instrument(skip_all, fields(host = %config.host, port = config.port))]
    pub async fn start_with_ledger(
        config: ServerConfig,
        ledger: MessageLedger,
    ) -> Result<Self, ServerError> {
        let addr = SocketAddr::new(config.host, config.port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let url = base_url(local_addr, &config.route_prefix())?;
        let config = Arc::new(config);
        let relay = Arc::new(LocalRelay::new(url, ledger.clone(), config.clone()));

        let autosave = ledger
            .store()
            .path()
            .is_some()
            .then(|| ledger.store().spawn_autosave(config.autosave_interval));
        let pruner = Pruner::spawn(ledger, config.lifetime, config.prune_interval);

        let (stop, stop_rx) = oneshot::channel::<()>();
        let app = routes::router(relay.clone());
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
        });

        info!(url = %relay.url(), name = %config.name, "Relay server listening");

        Ok(Self {
            local_addr,
            relay,
            autosave,
            pruner,
            stop: Some(stop),
            task,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL clients should use, including the route prefix.
    pub fn url(&self) -> &ServerUrl {
        self.relay.url()
    }

    pub fn ledger(&self) -> &MessageLedger {
        self.relay.ledger()
    }

    /// The relay behind the HTTP routes, callable in-process.
    pub fn relay(&self) -> Arc<LocalRelay> {
        self.relay.clone()
    }

    /// Stop accepting requests, stop background tasks, and flush the store.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        match (&mut self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "HTTP server stopped with an error"),
            Err(e) => warn!(error = %e, "HTTP server task failed"),
        }

        if let Some(pruner) = self.pruner.take() {
            pruner.stop().await;
        }
        if let Some(autosave) = self.autosave.take() {
            autosave.shutdown().await?;
        }

        info!("Relay server stopped");
        Ok(())
    }

    /// Serve until Ctrl-C, then shut down cleanly.
    pub async fn run_until_ctrl_c(self) -> Result<(), ServerError> {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl-C, shutting down");
        self.shutdown().await
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// `http://addr:port/prefix`, with an unspecified bind address replaced by
/// loopback so the URL is usable from the same machine.
fn base_url(addr: SocketAddr, prefix: &str) -> desu_core::Result<ServerUrl> {
    let ip = match addr.ip() {
        ip if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        ip => ip,
    };
    ServerUrl::new(format!("http://{}{}", SocketAddr::new(ip, addr.port()), prefix))
}
