use herd_core::util::normalize_text_option;
use herd_core::{
    Cattle, Entity, EntityId, EntityKind, Expense, Feeding, ListQuery, MilkProduction, Revenue,
};

use crate::commands::common::{format_record_line, CliGateway};
use crate::error::CliError;

pub fn build_query(
    cattle_id: Option<String>,
    date_from: Option<String>,
    date_to: Option<String>,
) -> ListQuery {
    ListQuery {
        cattle_id: normalize_text_option(cattle_id).map(EntityId::new),
        date_from: normalize_text_option(date_from),
        date_to: normalize_text_option(date_to),
        ..ListQuery::default()
    }
}

pub async fn run_list(
    gateway: &CliGateway,
    kind: EntityKind,
    query: &ListQuery,
    as_json: bool,
) -> Result<(), CliError> {
    match kind {
        EntityKind::Cattle => print_records::<Cattle>(gateway, query, as_json).await,
        EntityKind::Milk => print_records::<MilkProduction>(gateway, query, as_json).await,
        EntityKind::Feeding => print_records::<Feeding>(gateway, query, as_json).await,
        EntityKind::Expense => print_records::<Expense>(gateway, query, as_json).await,
        EntityKind::Revenue => print_records::<Revenue>(gateway, query, as_json).await,
    }
}

async fn print_records<E: Entity>(
    gateway: &CliGateway,
    query: &ListQuery,
    as_json: bool,
) -> Result<(), CliError> {
    let records = gateway.list_with::<E>(query).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No {} records.", E::KIND);
        return Ok(());
    }

    for record in &records {
        println!("{}", format_record_line(E::KIND, record)?);
    }
    Ok(())
}
