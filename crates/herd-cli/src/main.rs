//! Herd CLI - record keeping for cattle farms from the command line
//!
//! Reads and writes go through the offline gateway: they work without a
//! connection and are pushed to the backend once it is reachable again.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::Parser;
use herd_core::EntityKind;

use crate::cli::{Cli, Commands};
use crate::commands::common::{
    build_payload, default_config_path, load_effective_config, normalize_record_id, open_gateway,
    resolve_db_path, CliGateway,
};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::create::run_create;
use crate::commands::delete::run_delete;
use crate::commands::list::{build_query, run_list};
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::commands::update::run_update;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "herd=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { command } => run_config(command),
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
        command => {
            let gateway = open_cli_gateway(cli.db_path, cli.offline).await?;
            run_gateway_command(&gateway, command).await
        }
    }
}

async fn run_gateway_command(gateway: &CliGateway, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::List {
            entity,
            cattle_id,
            from,
            to,
            json,
        } => {
            let query = build_query(cattle_id, from, to);
            run_list(gateway, EntityKind::from(entity), &query, json).await
        }
        Commands::Create { entity, payload } => {
            let payload = build_payload(&payload)?;
            run_create(gateway, EntityKind::from(entity), payload).await
        }
        Commands::Update {
            entity,
            id,
            payload,
        } => {
            let id = normalize_record_id(&id)?;
            let payload = build_payload(&payload)?;
            run_update(gateway, EntityKind::from(entity), &id, payload).await
        }
        Commands::Delete { entity, id } => {
            let id = normalize_record_id(&id)?;
            run_delete(gateway, EntityKind::from(entity), &id).await
        }
        Commands::Status { json } => run_status(gateway, json).await,
        Commands::Sync => run_sync(gateway).await,
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

async fn open_cli_gateway(
    db_path: Option<PathBuf>,
    offline: bool,
) -> Result<CliGateway, CliError> {
    let config = load_effective_config(&default_config_path()?)?;
    let db_path = resolve_db_path(db_path, &config)?;
    tracing::debug!("Using local store at {}", db_path.display());
    open_gateway(&config, &db_path, offline).await
}
