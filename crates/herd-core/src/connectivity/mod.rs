//! Connectivity signal
//!
//! Online/offline state is published through a `tokio::sync::watch` channel.
//! [`ConnectivityMonitor`] is the only writer; the gateway and any listeners
//! hold receivers.

mod probe;

use std::sync::Arc;

use tokio::sync::watch;

pub use probe::HealthProbe;

/// Single-writer handle for the online flag
#[derive(Clone, Debug)]
pub struct ConnectivityMonitor {
    sender: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (sender, _receiver) = watch::channel(initially_online);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// A receiver observing every future transition
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    pub fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    /// Publish the current state; returns whether it changed
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!(
                "Connectivity changed: {}",
                if online { "online" } else { "offline" }
            );
        }
        changed
    }
}
