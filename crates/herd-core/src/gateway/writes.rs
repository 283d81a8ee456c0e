use serde_json::Value;

use super::{Dirty, GatewayState, OfflineGateway};
use crate::error::{Error, Result};
use crate::models::{
    Entity, EntityId, EntityKind, FieldPatch, IdRemap, Mutation, Operation, OperationType,
    PendingOperation, Record,
};
use crate::remote::{RemoteError, RemoteResult, RemoteService};
use crate::store::KeyValueStore;

impl<S, R> OfflineGateway<S, R>
where
    S: KeyValueStore,
    R: RemoteService,
{
    /// Insert `data` locally under a temporary id, then try the remote service.
    ///
    /// Returns the server's record when the create is confirmed, otherwise
    /// the provisional record (the create is queued).
    pub async fn create<E: Entity>(&self, data: E) -> Record<E> {
        let mut state = self.state.lock().await;
        let mut data = data;
        data.remap_references(&state.remap);

        let provisional = Record::provisional(data);
        E::mirror_mut(&mut state.mirrors).insert_front(provisional.clone());
        self.persist(&mut state, &Dirty::kind(E::KIND)).await;

        let mutation = Mutation::Create {
            temp_id: provisional.id.clone(),
            payload: provisional.data.clone(),
        };
        if self.ready(&state, &mutation) {
            match self.confirm(&mut state, &mutation).await {
                Ok((dirty, confirmed)) => {
                    self.persist(&mut state, &dirty).await;
                    return confirmed.unwrap_or(provisional);
                }
                Err(error) => log_deferred(E::KIND, "create", &error),
            }
        }

        self.enqueue(&mut state, E::into_operation(mutation)).await;
        provisional
    }

    /// Merge `changes` into the record `id`, then try the remote service.
    ///
    /// Returns the locally updated record, or `None` when `id` is not in the
    /// mirror (the update is still sent or queued). Fails with
    /// [`Error::InvalidInput`] before touching any state when a field does not
    /// fit `E` or a temporary id has no pending create behind it.
    pub async fn update<E: Entity>(
        &self,
        id: &EntityId,
        changes: FieldPatch,
    ) -> Result<Option<Record<E>>> {
        let mut state = self.state.lock().await;
        let mut id = id.clone();
        state.remap.apply(&mut id);
        let mut changes = changes;
        changes.remap_references(&state.remap);

        let mut references = changes.temporary_references();
        references.push(id.clone());
        check_temporary_ids(&state, &references)?;

        let updated = match E::mirror_mut(&mut state.mirrors).get_mut(&id) {
            Some(record) => {
                record.apply_patch(&changes)?;
                Some(record.clone())
            }
            None => {
                changes.check_fits::<E>()?;
                None
            }
        };
        if updated.is_some() {
            self.persist(&mut state, &Dirty::kind(E::KIND)).await;
        }

        let mutation = Mutation::Update { id, changes };
        if self.ready(&state, &mutation) {
            match self.confirm(&mut state, &mutation).await {
                Ok((dirty, _)) => {
                    self.persist(&mut state, &dirty).await;
                    return Ok(updated);
                }
                Err(error) => log_deferred(E::KIND, "update", &error),
            }
        }

        self.enqueue(&mut state, E::into_operation(mutation)).await;
        Ok(updated)
    }

    /// Remove the record `id` locally, then try the remote service.
    ///
    /// Fails with [`Error::InvalidInput`] for a temporary id that has no
    /// pending create behind it.
    pub async fn delete<E: Entity>(&self, id: &EntityId) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut id = id.clone();
        state.remap.apply(&mut id);
        check_temporary_ids(&state, std::slice::from_ref(&id))?;

        if E::mirror_mut(&mut state.mirrors).remove(&id).is_some() {
            self.persist(&mut state, &Dirty::kind(E::KIND)).await;
        }

        let mutation = Mutation::Delete { id };
        if self.ready(&state, &mutation) {
            match self.confirm(&mut state, &mutation).await {
                Ok((dirty, _)) => {
                    self.persist(&mut state, &dirty).await;
                    return Ok(());
                }
                Err(error) => log_deferred(E::KIND, "delete", &error),
            }
        }

        self.enqueue(&mut state, E::into_operation(mutation)).await;
        Ok(())
    }

    /// Whether `mutation` may go to the remote service right away.
    ///
    /// Not while offline, while it points at an unconfirmed temporary id, or
    /// while an earlier write to the same record is still queued.
    fn ready<E: Entity>(&self, state: &GatewayState, mutation: &Mutation<E>) -> bool {
        if !self.is_online() || !mutation.unresolved_references().is_empty() {
            return false;
        }
        let subject = mutation.subject();
        !state.queue.iter().any(|pending| {
            pending.operation.kind() == E::KIND && pending.operation.subject() == subject
        })
    }

    /// Send `mutation` and fold the confirmation into local state.
    ///
    /// For a create, also returns the confirmed record.
    pub(super) async fn confirm<E: Entity>(
        &self,
        state: &mut GatewayState,
        mutation: &Mutation<E>,
    ) -> RemoteResult<(Dirty, Option<Record<E>>)> {
        match mutation {
            Mutation::Create { temp_id, payload } => {
                let body = serde_json::to_value(payload)
                    .map_err(|error| RemoteError::InvalidPayload(error.to_string()))?;
                let response = self.remote.create(E::KIND, body).await?;
                let fallback = E::mirror(&state.mirrors)
                    .get(temp_id)
                    .cloned()
                    .unwrap_or_else(|| Record {
                        id: temp_id.clone(),
                        data: payload.clone(),
                        created_at: None,
                        updated_at: None,
                    });
                let record = confirmed_record(response, fallback)?;
                tracing::debug!("Confirmed {} {temp_id} as {}", E::KIND, record.id);
                let dirty = apply_confirmed_create(state, temp_id, record.clone());
                Ok((dirty, Some(record)))
            }
            Mutation::Update { id, changes } => {
                self.remote.update(E::KIND, id, changes.to_value()).await?;
                tracing::debug!("Confirmed {} update of {id}", E::KIND);
                Ok((Dirty::default(), None))
            }
            Mutation::Delete { id } => {
                self.remote.delete(E::KIND, id).await?;
                tracing::debug!("Confirmed {} delete of {id}", E::KIND);
                let dirty = if E::mirror_mut(&mut state.mirrors).remove(id).is_some() {
                    Dirty::kind(E::KIND)
                } else {
                    Dirty::default()
                };
                Ok((dirty, None))
            }
        }
    }

    async fn enqueue(&self, state: &mut GatewayState, operation: Operation) {
        tracing::info!(
            "Queued {} {} for {}",
            operation.kind(),
            operation.operation_type(),
            operation.subject()
        );
        state.queue.push(PendingOperation::new(operation));
        let dirty = Dirty {
            queue: true,
            ..Dirty::default()
        };
        self.persist(state, &dirty).await;
    }
}

/// The server's record for a confirmed create.
///
/// Falls back to the local field set when the response only carries an id.
fn confirmed_record<E: Entity>(response: Value, fallback: Record<E>) -> RemoteResult<Record<E>> {
    let id = response
        .get("_id")
        .or_else(|| response.get("id"))
        .cloned()
        .and_then(|id| serde_json::from_value::<EntityId>(id).ok())
        .ok_or_else(|| {
            RemoteError::InvalidPayload(format!("{} create response carried no id", E::KIND))
        })?;

    match serde_json::from_value::<Record<E>>(response) {
        Ok(record) => Ok(record),
        Err(error) => {
            tracing::debug!("Keeping local fields for {} {id}: {error}", E::KIND);
            Ok(Record { id, ..fallback })
        }
    }
}

/// Swap a temporary id for its server id everywhere in local state
fn apply_confirmed_create<E: Entity>(
    state: &mut GatewayState,
    temp_id: &EntityId,
    mut record: Record<E>,
) -> Dirty {
    let canonical = record.id.clone();
    let mut remap = IdRemap::new();
    remap.insert(temp_id.clone(), canonical.clone());

    let mut dirty = Dirty::kind(E::KIND);
    for pending in &mut state.queue {
        dirty.queue |= pending.operation.remap(&remap);
    }

    // queued writes against the provisional record still hold locally
    let mut deleted = false;
    for mutation in state
        .queue
        .iter()
        .filter_map(|pending| E::as_mutation(&pending.operation))
    {
        match mutation {
            Mutation::Update { id, changes } if id == &canonical => {
                if let Err(error) = record.apply_patch(changes) {
                    tracing::debug!("Skipping queued patch for {canonical}: {error}");
                }
            }
            Mutation::Delete { id } if id == &canonical => deleted = true,
            _ => {}
        }
    }

    let mirror = E::mirror_mut(&mut state.mirrors);
    if deleted {
        mirror.remove(temp_id);
    } else {
        mirror.replace_id(temp_id, record);
    }
    for kind in state.mirrors.remap_references(&remap) {
        dirty.mark(kind);
    }
    state.remap.insert(temp_id.clone(), canonical);
    dirty.remap = true;
    dirty
}

/// Every temporary id in `ids` must still have its create in the queue
fn check_temporary_ids(state: &GatewayState, ids: &[EntityId]) -> Result<()> {
    for id in ids.iter().filter(|id| id.is_temporary()) {
        let pending_create = state.queue.iter().any(|pending| {
            pending.operation.operation_type() == OperationType::Create
                && pending.operation.subject() == id
        });
        if !pending_create {
            return Err(Error::InvalidInput(format!(
                "Unknown temporary id {id}; it was never created here"
            )));
        }
    }
    Ok(())
}

fn log_deferred(kind: EntityKind, action: &str, error: &RemoteError) {
    if error.is_connectivity() {
        tracing::debug!("Queueing {kind} {action}; remote unreachable: {error}");
    } else {
        tracing::warn!("Queueing {kind} {action}: {error}");
    }
}
