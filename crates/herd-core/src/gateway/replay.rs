use super::{Dirty, GatewayState, OfflineGateway, SyncReport};
use crate::models::{
    Cattle, Entity, Expense, Feeding, ListQuery, MilkProduction, Mutation, Operation, Revenue,
};
use crate::remote::{RemoteResult, RemoteService};
use crate::store::KeyValueStore;
use crate::util::unix_millis_now;

impl<S, R> OfflineGateway<S, R>
where
    S: KeyValueStore,
    R: RemoteService,
{
    /// Replay the queue in order against the remote service.
    ///
    /// Confirmed operations leave the queue; failed ones stay and the pass
    /// moves on. Operations that still point at an unconfirmed temporary id
    /// are held back. Does nothing while offline.
    pub async fn sync_pending_operations(&self) -> SyncReport {
        let mut state = self.state.lock().await;
        self.sync_locked(&mut state).await
    }

    /// Push the queue, then refetch every collection
    pub async fn force_sync(&self) -> SyncReport {
        let mut state = self.state.lock().await;
        let report = self.sync_locked(&mut state).await;
        if report.online {
            self.refresh_all(&mut state).await;
        }
        report
    }

    async fn sync_locked(&self, state: &mut GatewayState) -> SyncReport {
        if !self.is_online() {
            tracing::debug!("Skipping sync while offline");
            return SyncReport {
                remaining: state.queue.len(),
                ..SyncReport::default()
            };
        }

        let mut report = SyncReport {
            online: true,
            ..SyncReport::default()
        };
        let mut dirty = Dirty::default();
        let mut index = 0;

        while index < state.queue.len() {
            let pending = state.queue[index].clone();
            let operation = &pending.operation;

            if !operation.unresolved_references().is_empty() {
                tracing::debug!(
                    "Holding {} {} for {} until its references are confirmed",
                    operation.kind(),
                    operation.operation_type(),
                    operation.subject()
                );
                report.blocked += 1;
                index += 1;
                continue;
            }

            report.attempted += 1;
            match self.replay(state, operation).await {
                Ok(changed) => {
                    state.queue.remove(index);
                    dirty.merge(changed);
                    dirty.queue = true;
                    report.synced += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        "Failed to sync {} {} for {}: {error}",
                        operation.kind(),
                        operation.operation_type(),
                        operation.subject()
                    );
                    report.failed += 1;
                    index += 1;
                }
            }
        }

        report.remaining = state.queue.len();
        state.last_sync = Some(unix_millis_now());
        dirty.last_sync = true;
        self.persist(state, &dirty).await;

        tracing::info!(
            "Sync finished: {} synced, {} failed, {} blocked",
            report.synced,
            report.failed,
            report.blocked
        );
        report
    }

    async fn replay(&self, state: &mut GatewayState, operation: &Operation) -> RemoteResult<Dirty> {
        match operation {
            Operation::Cattle(mutation) => self.replay_mutation(state, mutation).await,
            Operation::Milk(mutation) => self.replay_mutation(state, mutation).await,
            Operation::Feeding(mutation) => self.replay_mutation(state, mutation).await,
            Operation::Expense(mutation) => self.replay_mutation(state, mutation).await,
            Operation::Revenue(mutation) => self.replay_mutation(state, mutation).await,
        }
    }

    async fn replay_mutation<E: Entity>(
        &self,
        state: &mut GatewayState,
        mutation: &Mutation<E>,
    ) -> RemoteResult<Dirty> {
        let (dirty, _) = self.confirm(state, mutation).await?;
        Ok(dirty)
    }

    async fn refresh_all(&self, state: &mut GatewayState) {
        self.refresh_logged::<Cattle>(state).await;
        self.refresh_logged::<MilkProduction>(state).await;
        self.refresh_logged::<Feeding>(state).await;
        self.refresh_logged::<Expense>(state).await;
        self.refresh_logged::<Revenue>(state).await;
    }

    async fn refresh_logged<E: Entity>(&self, state: &mut GatewayState) {
        if let Err(error) = self.refresh::<E>(state, &ListQuery::default()).await {
            tracing::warn!("Failed to refresh {}: {error}", E::KIND);
        }
    }
}
