use herd_core::SyncReport;

use crate::commands::common::CliGateway;
use crate::error::CliError;

pub async fn run_sync(gateway: &CliGateway) -> Result<(), CliError> {
    let report = gateway.force_sync().await;
    println!("{}", format_sync_report(&report));
    Ok(())
}

pub fn format_sync_report(report: &SyncReport) -> String {
    if !report.online {
        return format!(
            "Offline: {} pending operations kept for later",
            report.remaining
        );
    }
    if report.attempted == 0 && report.remaining == 0 {
        return "Sync completed; nothing was pending".to_string();
    }
    format!(
        "Sync completed: {} synced, {} failed, {} waiting on unsynced records, {} pending",
        report.synced, report.failed, report.blocked, report.remaining
    )
}
