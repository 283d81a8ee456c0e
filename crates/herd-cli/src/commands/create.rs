use herd_core::{Cattle, Entity, EntityKind, Expense, Feeding, MilkProduction, Record, Revenue};
use serde_json::{Map, Value};

use crate::commands::common::CliGateway;
use crate::error::CliError;

pub async fn run_create(
    gateway: &CliGateway,
    kind: EntityKind,
    payload: Map<String, Value>,
) -> Result<(), CliError> {
    match kind {
        EntityKind::Cattle => create_as::<Cattle>(gateway, payload).await,
        EntityKind::Milk => create_as::<MilkProduction>(gateway, payload).await,
        EntityKind::Feeding => create_as::<Feeding>(gateway, payload).await,
        EntityKind::Expense => create_as::<Expense>(gateway, payload).await,
        EntityKind::Revenue => create_as::<Revenue>(gateway, payload).await,
    }
}

/// Type the payload as `E`; fails before anything is written
pub fn parse_entity<E: Entity>(payload: Map<String, Value>) -> Result<E, CliError> {
    serde_json::from_value(Value::Object(payload))
        .map_err(|error| CliError::InvalidPayload(format!("{}: {error}", E::KIND)))
}

async fn create_as<E: Entity>(
    gateway: &CliGateway,
    payload: Map<String, Value>,
) -> Result<(), CliError> {
    let data = parse_entity::<E>(payload)?;
    let record: Record<E> = gateway.create(data).await;

    println!("{}", record.id);
    if record.is_provisional() {
        eprintln!("Saved locally; queued for sync");
    }
    Ok(())
}
