use herd_core::models::PendingOperation;
use herd_core::SyncStatus;
use serde::Serialize;

use crate::commands::common::{format_last_sync, format_operation_line, CliGateway};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusItem {
    pub online: bool,
    #[serde(flatten)]
    pub status: SyncStatus,
    pub pending: Vec<PendingOperation>,
}

pub async fn run_status(gateway: &CliGateway, as_json: bool) -> Result<(), CliError> {
    let item = StatusItem {
        online: gateway.is_online(),
        status: gateway.sync_status().await,
        pending: gateway.pending_operations().await,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    for line in format_status_lines(&item) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_status_lines(item: &StatusItem) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Connection: {}",
            if item.online { "online" } else { "offline" }
        ),
        format!("Pending operations: {}", item.status.pending_count),
        format!("Last sync: {}", format_last_sync(item.status.last_sync)),
    ];
    if item.status.persistence_degraded {
        lines.push(
            "Warning: local store writes failed; recent changes may not survive a restart"
                .to_string(),
        );
    }
    lines.extend(item.pending.iter().map(format_operation_line));
    lines
}
