//! Health-check polling that drives the connectivity signal

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::ConnectivityMonitor;
use crate::remote::RemoteService;

/// Background task polling `GET /health`. Stops when dropped.
pub struct HealthProbe {
    handle: JoinHandle<()>,
}

impl HealthProbe {
    /// Run a single health check and publish the result
    pub async fn probe_once<R>(remote: &R, monitor: &ConnectivityMonitor) -> bool
    where
        R: RemoteService + ?Sized,
    {
        let online = match remote.health().await {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!("Health check failed: {error}");
                false
            }
        };
        monitor.set_online(online);
        online
    }

    /// Poll every `interval`, publishing transitions through `monitor`
    pub fn spawn<R>(remote: Arc<R>, monitor: ConnectivityMonitor, interval: Duration) -> Self
    where
        R: RemoteService + ?Sized + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                Self::probe_once(remote.as_ref(), &monitor).await;
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for HealthProbe {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityId, EntityKind, ListQuery};
    use crate::remote::{RemoteError, RemoteResult};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlakyHealth {
        up: AtomicBool,
    }

    #[async_trait]
    impl RemoteService for FlakyHealth {
        async fn list(&self, _: EntityKind, _: &ListQuery) -> RemoteResult<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn create(&self, _: EntityKind, payload: Value) -> RemoteResult<Value> {
            Ok(payload)
        }

        async fn update(&self, _: EntityKind, _: &EntityId, changes: Value) -> RemoteResult<Value> {
            Ok(changes)
        }

        async fn delete(&self, _: EntityKind, _: &EntityId) -> RemoteResult<()> {
            Ok(())
        }

        async fn health(&self) -> RemoteResult<()> {
            if self.up.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(RemoteError::Unreachable("down".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn test_probe_once_publishes_result() {
        let remote = FlakyHealth {
            up: AtomicBool::new(false),
        };
        let monitor = ConnectivityMonitor::new(true);

        assert!(!HealthProbe::probe_once(&remote, &monitor).await);
        assert!(!monitor.is_online());

        remote.up.store(true, Ordering::SeqCst);
        assert!(HealthProbe::probe_once(&remote, &monitor).await);
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn test_spawned_probe_flips_monitor() {
        let remote = Arc::new(FlakyHealth {
            up: AtomicBool::new(true),
        });
        let monitor = ConnectivityMonitor::new(false);
        let mut receiver = monitor.subscribe();

        let probe = HealthProbe::spawn(remote, monitor.clone(), Duration::from_millis(10));
        tokio::time::timeout(Duration::from_secs(5), receiver.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(monitor.is_online());
        probe.stop();
    }
}
