// src/devserver/reload.rs

use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 16;

/// Fan-out of reload notifications to connected browsers.
///
/// Cheap to clone; every clone talks to the same subscribers.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<()>,
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Ask every connected browser to reload. Returns how many listeners
    /// were notified.
    pub fn reload(&self) -> usize {
        let notified = self.tx.send(()).unwrap_or(0);
        debug!(listeners = notified, "reload broadcast");
        notified
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }
}
