use super::{Dirty, GatewayState, OfflineGateway};
use crate::models::{Entity, ListQuery, Mirror, Mutation, PendingOperation, Record};
use crate::remote::{RemoteError, RemoteResult, RemoteService};
use crate::store::KeyValueStore;

impl<S, R> OfflineGateway<S, R>
where
    S: KeyValueStore,
    R: RemoteService,
{
    /// Every record of `E`
    pub async fn list<E: Entity>(&self) -> Vec<Record<E>> {
        self.list_with(&ListQuery::default()).await
    }

    /// Records of `E` matching `query`.
    ///
    /// Served by the remote service when online, otherwise (or when the
    /// remote call fails) from the local mirror. Never fails.
    pub async fn list_with<E: Entity>(&self, query: &ListQuery) -> Vec<Record<E>> {
        let mut state = self.state.lock().await;
        if self.is_online() {
            match self.refresh::<E>(&mut state, query).await {
                Ok(records) => return records,
                Err(error) => {
                    tracing::warn!("Serving {} from the local mirror: {error}", E::KIND);
                }
            }
        }

        E::mirror(&state.mirrors)
            .records()
            .iter()
            .filter(|record| record.data.matches(query))
            .cloned()
            .collect()
    }

    /// Fetch `E` from the remote service and fold it into the mirror
    pub(super) async fn refresh<E: Entity>(
        &self,
        state: &mut GatewayState,
        query: &ListQuery,
    ) -> RemoteResult<Vec<Record<E>>> {
        let fetched = self
            .remote
            .list(E::KIND, query)
            .await?
            .into_iter()
            .map(serde_json::from_value::<Record<E>>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| RemoteError::InvalidPayload(format!("{} list: {error}", E::KIND)))?;
        tracing::debug!("Fetched {} {} records", fetched.len(), E::KIND);

        let merged = overlay_pending(fetched, E::mirror(&state.mirrors), &state.queue);
        let records = if query.is_unfiltered() {
            let mirror = E::mirror_mut(&mut state.mirrors);
            mirror.replace_all(merged);
            mirror.records().to_vec()
        } else {
            let mirror = E::mirror_mut(&mut state.mirrors);
            for record in &merged {
                mirror.upsert(record.clone());
            }
            merged
                .into_iter()
                .filter(|record| record.data.matches(query))
                .collect()
        };

        self.persist(state, &Dirty::kind(E::KIND)).await;
        Ok(records)
    }
}

/// Re-apply queued local writes on top of a fetched snapshot.
///
/// Provisional records come first (newest first), records with a queued
/// update keep their local version and records with a queued delete are
/// dropped.
fn overlay_pending<E: Entity>(
    mut fetched: Vec<Record<E>>,
    local: &Mirror<E>,
    queue: &[PendingOperation],
) -> Vec<Record<E>> {
    let mut provisional = Vec::new();

    for mutation in queue.iter().filter_map(|pending| E::as_mutation(&pending.operation)) {
        match mutation {
            Mutation::Create { temp_id, .. } => {
                if let Some(record) = local.get(temp_id) {
                    provisional.push(record.clone());
                }
            }
            Mutation::Update { id, changes } => {
                let Some(record) = fetched.iter_mut().find(|record| &record.id == id) else {
                    continue;
                };
                match local.get(id) {
                    Some(local_record) => *record = local_record.clone(),
                    None => {
                        if let Err(error) = record.apply_patch(changes) {
                            tracing::debug!("Skipping queued patch for {id}: {error}");
                        }
                    }
                }
            }
            Mutation::Delete { id } => {
                fetched.retain(|record| &record.id != id);
                provisional.retain(|record| &record.id != id);
            }
        }
    }

    provisional.reverse();
    provisional.extend(fetched);
    provisional
}
