use herd_core::{
    Cattle, Entity, EntityId, EntityKind, Expense, Feeding, FieldPatch, MilkProduction, Revenue,
};
use serde_json::{Map, Value};

use crate::commands::common::{format_write_outcome, CliGateway};
use crate::error::CliError;

pub async fn run_update(
    gateway: &CliGateway,
    kind: EntityKind,
    id: &EntityId,
    payload: Map<String, Value>,
) -> Result<(), CliError> {
    let patch = FieldPatch::from_value(Value::Object(payload))?;
    match kind {
        EntityKind::Cattle => update_as::<Cattle>(gateway, id, patch).await,
        EntityKind::Milk => update_as::<MilkProduction>(gateway, id, patch).await,
        EntityKind::Feeding => update_as::<Feeding>(gateway, id, patch).await,
        EntityKind::Expense => update_as::<Expense>(gateway, id, patch).await,
        EntityKind::Revenue => update_as::<Revenue>(gateway, id, patch).await,
    }
}

async fn update_as<E: Entity>(
    gateway: &CliGateway,
    id: &EntityId,
    patch: FieldPatch,
) -> Result<(), CliError> {
    let queued_before = gateway.sync_status().await.pending_count;
    let updated = gateway.update::<E>(id, patch).await?;

    match &updated {
        Some(record) => println!("{}", record.id),
        None => {
            println!("{id}");
            eprintln!("{id} is not in the local {} mirror", E::KIND);
        }
    }
    let pending = gateway.pending_operations().await;
    eprintln!("{}", format_write_outcome(queued_before, &pending));
    Ok(())
}
