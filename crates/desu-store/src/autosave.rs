//! Background flushing of a [`FileStore`].

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use desu_core::Result;

use crate::store::FileStore;

/// Default autosave period.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_millis(100);

/// Running autosave task. Dropping the handle aborts the task without a
/// final flush; use [`AutosaveHandle::shutdown`] to stop cleanly.
#[derive(Debug)]
pub struct AutosaveHandle {
    store: FileStore,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FileStore {
    /// Flush this store every `interval` on the current tokio runtime.
    ///
    /// A failed flush is logged and retried on the next tick; it never
    /// reaches the callers that wrote the records.
    pub fn spawn_autosave(&self, interval: Duration) -> AutosaveHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let store = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if let Err(e) = store.flush() {
                            warn!(error = %e, "Autosave failed, retrying on next tick");
                        }
                    }
                }
            }
            debug!("Autosave stopped");
        });

        AutosaveHandle {
            store: self.clone(),
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

impl AutosaveHandle {
    /// Stop the task and flush whatever is still pending.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.store.flush()?;
        Ok(())
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
