use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use herd_core::config::{GatewayConfig, CONFIG_FILE_NAME};
use herd_core::connectivity::{ConnectivityMonitor, HealthProbe};
use herd_core::models::PendingOperation;
use herd_core::remote::HttpRemote;
use herd_core::store::SqliteStore;
use herd_core::util::normalize_text_option;
use herd_core::{EntityId, EntityKind, OfflineGateway, Record};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::PayloadArgs;
use crate::error::CliError;

const DB_FILE_NAME: &str = "herd.db";

pub type CliGateway = OfflineGateway<SqliteStore, HttpRemote>;

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("herd").join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve config directory".to_string()))
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("herd").join(DB_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve data directory".to_string()))
}

/// File config with `HERD_*` environment overrides applied
pub fn load_effective_config(path: &Path) -> Result<GatewayConfig, CliError> {
    let mut config = GatewayConfig::load_from_path(path)?;
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

/// `--db-path` wins over the config file, which wins over the platform default
pub fn resolve_db_path(
    explicit: Option<PathBuf>,
    config: &GatewayConfig,
) -> Result<PathBuf, CliError> {
    match explicit.or_else(|| config.db_path.clone()) {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

/// Open the local store and the remote client, probing connectivity once
pub async fn open_gateway(
    config: &GatewayConfig,
    db_path: &Path,
    offline: bool,
) -> Result<CliGateway, CliError> {
    let store = SqliteStore::open(db_path)?;
    let remote = HttpRemote::new(config.remote_config()?)?;
    let monitor = ConnectivityMonitor::new(false);

    if offline {
        tracing::debug!("Offline mode requested; skipping health check");
    } else if !HealthProbe::probe_once(&remote, &monitor).await {
        tracing::info!(
            "{} is unreachable; using the local store",
            config.api_base_url()
        );
    }

    Ok(OfflineGateway::open(store, remote, monitor.subscribe()).await)
}

pub fn normalize_record_id(id: &str) -> Result<EntityId, CliError> {
    normalize_text_option(Some(id.to_string()))
        .map(EntityId::new)
        .ok_or(CliError::EmptyRecordId)
}

/// Merge `--data` and `--field` arguments into one JSON object
pub fn build_payload(args: &PayloadArgs) -> Result<Map<String, Value>, CliError> {
    let mut payload = match args.data.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => map,
            other => {
                return Err(CliError::InvalidPayload(format!(
                    "--data must be a JSON object, got {other}"
                )))
            }
        },
        _ => Map::new(),
    };

    for field in &args.fields {
        let (key, value) = parse_field(field)?;
        payload.insert(key, value);
    }

    if payload.is_empty() {
        return Err(CliError::EmptyPayload);
    }
    Ok(payload)
}

/// Parse `key=value`; the value is JSON when it parses, text otherwise
pub fn parse_field(raw: &str) -> Result<(String, Value), CliError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::InvalidField(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidField(raw.to_string()));
    }

    let value = value.trim();
    let parsed = serde_json::from_str::<Value>(value)
        .unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), parsed))
}

/// One-line summary of a record for terminal output
pub fn format_record_line<E: Serialize>(
    kind: EntityKind,
    record: &Record<E>,
) -> Result<String, CliError> {
    let fields = serde_json::to_value(&record.data)?;
    let summary = record_summary(kind, &fields);
    let marker = if record.id.is_temporary() {
        "  (not synced)"
    } else {
        ""
    };
    Ok(format!("{}  {summary}{marker}", record.id))
}

fn record_summary(kind: EntityKind, fields: &Value) -> String {
    let text = |key: &str| match fields.get(key) {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    };

    match kind {
        EntityKind::Cattle => format!("{} {}", text("tag_number"), text("name")),
        EntityKind::Milk => format!(
            "{} {} L on {}",
            text("cattle_id"),
            text("quantity_liters"),
            text("date_recorded")
        ),
        EntityKind::Feeding => format!(
            "{} {} {} kg on {}",
            text("cattle_id"),
            text("feed_type"),
            text("quantity_kg"),
            text("date_recorded")
        ),
        EntityKind::Expense => format!(
            "{} {} ({})",
            text("category"),
            text("amount"),
            text("description")
        ),
        EntityKind::Revenue => format!(
            "{} {} ({})",
            text("source"),
            text("amount"),
            text("description")
        ),
    }
}

pub fn format_operation_line(pending: &PendingOperation) -> String {
    let queued_at = DateTime::from_timestamp_millis(pending.timestamp)
        .map_or_else(|| pending.timestamp.to_string(), |time| format_timestamp(&time));
    format!(
        "{}  {queued_at}  {} {} {}",
        pending.id,
        pending.operation.operation_type(),
        pending.operation.kind(),
        pending.operation.subject()
    )
}

/// Where a write went, judged by whether it grew the queue past `queued_before`
pub fn format_write_outcome(queued_before: usize, pending: &[PendingOperation]) -> &'static str {
    match pending.last() {
        Some(last) if pending.len() > queued_before => {
            if last.operation.unresolved_references().is_empty() {
                "Queued for sync"
            } else {
                "Queued for sync; waits until the records it references are synced"
            }
        }
        _ => "Sent to the server",
    }
}

pub fn format_last_sync(last_sync: Option<DateTime<Utc>>) -> String {
    last_sync.map_or_else(|| "never".to_string(), |time| format_timestamp(&time))
}

fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
