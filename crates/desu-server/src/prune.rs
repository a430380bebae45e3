//! Periodic pruning of expired messages.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use desu_store::MessageLedger;

/// Running pruning task.
#[derive(Debug)]
pub(crate) struct Pruner {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Pruner {
    /// Prune messages older than `lifetime` ms every `interval`. Returns
    /// `None` when `lifetime` is 0, which keeps messages forever.
    pub(crate) fn spawn(ledger: MessageLedger, lifetime: u64, interval: Duration) -> Option<Self> {
        if lifetime == 0 {
            debug!("Message lifetime is 0, pruning disabled");
            return None;
        }

        let (stop, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if let Err(e) = ledger.prune_expired(lifetime) {
                            warn!(error = %e, "Pruning failed");
                        }
                    }
                }
            }
        });

        Some(Self { stop, task })
    }

    pub(crate) async fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.task.await;
    }
}
