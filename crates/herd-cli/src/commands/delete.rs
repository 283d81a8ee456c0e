use herd_core::{Cattle, EntityId, EntityKind, Expense, Feeding, MilkProduction, Revenue};

use crate::commands::common::{format_write_outcome, CliGateway};
use crate::error::CliError;

pub async fn run_delete(
    gateway: &CliGateway,
    kind: EntityKind,
    id: &EntityId,
) -> Result<(), CliError> {
    let queued_before = gateway.sync_status().await.pending_count;
    match kind {
        EntityKind::Cattle => gateway.delete::<Cattle>(id).await?,
        EntityKind::Milk => gateway.delete::<MilkProduction>(id).await?,
        EntityKind::Feeding => gateway.delete::<Feeding>(id).await?,
        EntityKind::Expense => gateway.delete::<Expense>(id).await?,
        EntityKind::Revenue => gateway.delete::<Revenue>(id).await?,
    }

    println!("{id}");
    let pending = gateway.pending_operations().await;
    eprintln!("{}", format_write_outcome(queued_before, &pending));
    Ok(())
}
