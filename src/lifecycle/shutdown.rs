//! Shutdown coordination.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::lifecycle::signals;

/// Broadcasts a single stop notice to every subscribed server.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver that resolves once [`Shutdown::trigger`] runs.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify subscribers. Returns how many were listening.
    pub fn trigger(&self, reason: &str) -> usize {
        let listeners = self.tx.send(()).unwrap_or(0);
        tracing::info!(reason, listeners, "Shutdown triggered");
        listeners
    }

    /// Trigger on the first OS termination signal.
    pub fn on_signal(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let signal = signals::wait_for_signal().await;
            this.trigger(signal);
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
