//! Offline-first data gateway
//!
//! [`OfflineGateway`] answers reads from the remote service when it is
//! reachable and from the local mirror otherwise. Writes are applied to the
//! mirror first; whatever the remote service does not confirm is queued and
//! replayed in order by [`OfflineGateway::sync_pending_operations`].
//!
//! Every public operation holds the state lock for its whole duration, so a
//! replay never interleaves with a write.

mod reads;
mod replay;
mod subscription;
mod writes;


use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex};

use crate::error::Result;
use crate::models::{EntityKind, IdRemap, Mirrors, PendingOperation};
use crate::remote::RemoteService;
use crate::store::{KeyValueStore, ID_REMAP_KEY, LAST_SYNC_KEY, PENDING_OPERATIONS_KEY};

pub use subscription::{spawn_sync_on_reconnect, SyncSubscription};

/// Local mirror + pending queue in front of a [`RemoteService`]
pub struct OfflineGateway<S, R> {
    store: Arc<S>,
    remote: Arc<R>,
    connectivity: watch::Receiver<bool>,
    state: Arc<Mutex<GatewayState>>,
}

impl<S, R> Clone for OfflineGateway<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            remote: Arc::clone(&self.remote),
            connectivity: self.connectivity.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

#[derive(Debug, Default)]
struct GatewayState {
    mirrors: Mirrors,
    queue: Vec<PendingOperation>,
    /// Every temporary id confirmed so far
    remap: IdRemap,
    /// Unix ms of the last completed sync pass
    last_sync: Option<i64>,
    persistence_degraded: bool,
}

/// Snapshot of the sync bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub pending_count: usize,
    pub last_sync: Option<DateTime<Utc>>,
    /// A local write failed; durable state may lag the in-memory state
    pub persistence_degraded: bool,
}

/// Outcome of one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// `false` when the pass was skipped because the gateway is offline
    pub online: bool,
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
    /// Left in place because they reference an unconfirmed temporary id
    pub blocked: usize,
    /// Queue length after the pass
    pub remaining: usize,
}

impl SyncReport {
    pub const fn is_clean(&self) -> bool {
        self.online && self.remaining == 0
    }
}

/// Store keys a state change needs to rewrite
#[derive(Debug, Default)]
struct Dirty {
    kinds: Vec<EntityKind>,
    queue: bool,
    remap: bool,
    last_sync: bool,
}

impl Dirty {
    fn kind(kind: EntityKind) -> Self {
        Self {
            kinds: vec![kind],
            ..Self::default()
        }
    }

    fn mark(&mut self, kind: EntityKind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    fn merge(&mut self, other: Self) {
        for kind in other.kinds {
            self.mark(kind);
        }
        self.queue |= other.queue;
        self.remap |= other.remap;
        self.last_sync |= other.last_sync;
    }
}

impl<S, R> OfflineGateway<S, R>
where
    S: KeyValueStore,
    R: RemoteService,
{
    /// Load mirrors, queue, confirmed ids and last-sync time from `store`.
    ///
    /// Missing keys start empty. Unreadable values are logged, skipped and
    /// flag the gateway as persistence-degraded.
    pub async fn open(store: S, remote: R, connectivity: watch::Receiver<bool>) -> Self {
        let mut state = GatewayState::default();

        for kind in EntityKind::ALL {
            let Some(raw) = read_key(&store, kind.storage_key(), &mut state).await else {
                continue;
            };
            if let Err(error) = state.mirrors.load_json(kind, &raw) {
                tracing::warn!("Discarding unreadable {kind} mirror: {error}");
                state.persistence_degraded = true;
            }
        }

        if let Some(raw) = read_key(&store, PENDING_OPERATIONS_KEY, &mut state).await {
            state.queue = parse_queue(&raw, &mut state.persistence_degraded);
        }

        if let Some(raw) = read_key(&store, ID_REMAP_KEY, &mut state).await {
            match serde_json::from_str::<IdRemap>(&raw) {
                Ok(remap) => state.remap = remap,
                Err(error) => {
                    tracing::warn!("Discarding unreadable confirmed id table: {error}");
                    state.persistence_degraded = true;
                }
            }
        }

        if let Some(raw) = read_key(&store, LAST_SYNC_KEY, &mut state).await {
            match raw.trim().parse::<i64>() {
                Ok(millis) => state.last_sync = Some(millis),
                Err(error) => {
                    tracing::warn!("Ignoring unreadable last sync timestamp {raw:?}: {error}");
                    state.persistence_degraded = true;
                }
            }
        }

        tracing::info!(
            "Opened offline gateway with {} pending operations",
            state.queue.len()
        );

        Self {
            store: Arc::new(store),
            remote: Arc::new(remote),
            connectivity,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Current value of the connectivity signal
    pub fn is_online(&self) -> bool {
        *self.connectivity.borrow()
    }

    pub async fn sync_status(&self) -> SyncStatus {
        let state = self.state.lock().await;
        SyncStatus {
            pending_count: state.queue.len(),
            last_sync: state.last_sync.and_then(DateTime::from_timestamp_millis),
            persistence_degraded: state.persistence_degraded,
        }
    }

    /// Snapshot of the queue, oldest first
    pub async fn pending_operations(&self) -> Vec<PendingOperation> {
        self.state.lock().await.queue.clone()
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the keys in `dirty` as one batch
    async fn persist(&self, state: &mut GatewayState, dirty: &Dirty) {
        let entries = match snapshot(state, dirty) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!("Failed to serialize offline state: {error}");
                state.persistence_degraded = true;
                return;
            }
        };
        if entries.is_empty() {
            return;
        }
        if let Err(error) = self.store.set_many(&entries).await {
            tracing::warn!("Failed to persist offline state: {error}");
            state.persistence_degraded = true;
        }
    }
}

async fn read_key<S: KeyValueStore>(
    store: &S,
    key: &str,
    state: &mut GatewayState,
) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!("Failed to read {key} from the local store: {error}");
            state.persistence_degraded = true;
            None
        }
    }
}

/// Parse the persisted queue entry by entry so one bad entry does not drop the rest
fn parse_queue(raw: &str, degraded: &mut bool) -> Vec<PendingOperation> {
    let entries: Vec<Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!("Discarding unreadable pending operation queue: {error}");
            *degraded = true;
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(pending) => Some(pending),
            Err(error) => {
                tracing::warn!("Dropping unreadable pending operation: {error}");
                *degraded = true;
                None
            }
        })
        .collect()
}

fn snapshot(state: &GatewayState, dirty: &Dirty) -> Result<Vec<(String, String)>> {
    let mut entries = Vec::new();
    for kind in &dirty.kinds {
        entries.push((kind.storage_key().to_string(), state.mirrors.to_json(*kind)?));
    }
    if dirty.queue {
        entries.push((
            PENDING_OPERATIONS_KEY.to_string(),
            serde_json::to_string(&state.queue)?,
        ));
    }
    if dirty.remap {
        entries.push((ID_REMAP_KEY.to_string(), serde_json::to_string(&state.remap)?));
    }
    if dirty.last_sync {
        if let Some(millis) = state.last_sync {
            entries.push((LAST_SYNC_KEY.to_string(), millis.to_string()));
        }
    }
    Ok(entries)
}
