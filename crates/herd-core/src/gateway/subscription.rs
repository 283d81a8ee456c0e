use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::OfflineGateway;
use crate::remote::RemoteService;
use crate::store::KeyValueStore;

/// Handle to a reconnect-sync task. The task stops when the handle is dropped.
pub struct SyncSubscription {
    handle: JoinHandle<()>,
}

impl SyncSubscription {
    pub fn unsubscribe(self) {
        self.handle.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SyncSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Run a sync pass on every offline to online transition of `connectivity`
pub fn spawn_sync_on_reconnect<S, R>(
    gateway: OfflineGateway<S, R>,
    mut connectivity: watch::Receiver<bool>,
) -> SyncSubscription
where
    S: KeyValueStore + 'static,
    R: RemoteService + 'static,
{
    let mut was_online = *connectivity.borrow_and_update();
    let handle = tokio::spawn(async move {
        while connectivity.changed().await.is_ok() {
            let online = *connectivity.borrow_and_update();
            if online && !was_online {
                tracing::info!("Connection restored, syncing pending operations");
                let report = gateway.sync_pending_operations().await;
                tracing::debug!("Reconnect sync report: {report:?}");
            }
            was_online = online;
        }
    });
    SyncSubscription { handle }
}
