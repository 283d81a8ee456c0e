use std::path::PathBuf;

use clap::Parser;
use herd_core::config::GatewayConfig;
use herd_core::models::{Mutation, Operation, PendingOperation};
use herd_core::{
    Cattle, EntityId, EntityKind, FieldPatch, MilkProduction, Record, SyncReport, SyncStatus,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::cli::{Cli, Commands, CompletionShell, EntityArg, PayloadArgs};
use crate::commands::common::{
    build_payload, format_last_sync, format_operation_line, format_record_line,
    format_write_outcome, normalize_record_id, open_gateway, parse_field, resolve_db_path,
};
use crate::commands::completions::render_completions;
use crate::commands::config::{format_config_lines, run_config_init};
use crate::commands::create::parse_entity;
use crate::commands::list::build_query;
use crate::commands::status::{format_status_lines, StatusItem};
use crate::commands::sync::format_sync_report;
use crate::error::CliError;

fn payload_args(data: Option<&str>, fields: &[&str]) -> PayloadArgs {
    PayloadArgs {
        data: data.map(str::to_string),
        fields: fields.iter().map(|field| (*field).to_string()).collect(),
    }
}

#[test]
fn parse_field_reads_json_values_and_falls_back_to_text() {
    assert_eq!(parse_field("weight=540").unwrap(), ("weight".to_string(), json!(540)));
    assert_eq!(parse_field("name=Bella").unwrap(), ("name".to_string(), json!("Bella")));
    assert_eq!(parse_field(" sold = true ").unwrap(), ("sold".to_string(), json!(true)));
    assert_eq!(parse_field("notes=").unwrap(), ("notes".to_string(), json!("")));
}

#[test]
fn parse_field_rejects_missing_key() {
    assert!(matches!(parse_field("weight"), Err(CliError::InvalidField(_))));
    assert!(matches!(parse_field("=540"), Err(CliError::InvalidField(_))));
}

#[test]
fn build_payload_merges_fields_over_data() {
    let payload = build_payload(&payload_args(
        Some(r#"{"tag_number": "GB0099", "name": "Test"}"#),
        &["name=Bella", "weight=512.5"],
    ))
    .unwrap();

    assert_eq!(
        Value::Object(payload),
        json!({"tag_number": "GB0099", "name": "Bella", "weight": 512.5})
    );
}

#[test]
fn build_payload_requires_an_object() {
    assert!(matches!(
        build_payload(&payload_args(Some("[1, 2]"), &[])),
        Err(CliError::InvalidPayload(_))
    ));
    assert!(matches!(
        build_payload(&payload_args(None, &[])),
        Err(CliError::EmptyPayload)
    ));
    assert!(matches!(
        build_payload(&payload_args(Some("  "), &[])),
        Err(CliError::EmptyPayload)
    ));
}

#[test]
fn parse_entity_reports_missing_fields() {
    let payload = build_payload(&payload_args(None, &["tag_number=GB0099"])).unwrap();
    let error = parse_entity::<Cattle>(payload).unwrap_err();
    assert!(error.to_string().contains("cattle"));
}

#[test]
fn normalize_record_id_trims_and_rejects_empty() {
    assert_eq!(normalize_record_id(" abc123 ").unwrap(), EntityId::new("abc123"));
    assert!(matches!(normalize_record_id("  "), Err(CliError::EmptyRecordId)));
}

#[test]
fn build_query_drops_blank_filters() {
    let query = build_query(
        Some(" srv-1 ".to_string()),
        Some(String::new()),
        Some("2026-10-31".to_string()),
    );
    assert_eq!(query.cattle_id, Some(EntityId::new("srv-1")));
    assert_eq!(query.date_from, None);
    assert_eq!(query.date_to.as_deref(), Some("2026-10-31"));
}

#[test]
fn record_lines_mark_unsynced_records() {
    let record = Record::provisional(Cattle::new("GB0099", "Test"));
    let line = format_record_line(EntityKind::Cattle, &record).unwrap();
    assert!(line.starts_with(record.id.as_str()));
    assert!(line.contains("GB0099 Test"));
    assert!(line.ends_with("(not synced)"));

    let mut milk = MilkProduction::new(EntityId::new("srv-1"), 12.5);
    milk.date_recorded = Some("2026-10-16".to_string());
    let record = Record {
        id: EntityId::new("srv-2"),
        data: milk,
        created_at: None,
        updated_at: None,
    };
    assert_eq!(
        format_record_line(EntityKind::Milk, &record).unwrap(),
        "srv-2  srv-1 12.5 L on 2026-10-16"
    );
}

#[test]
fn operation_lines_name_type_kind_and_subject() {
    let pending = PendingOperation {
        timestamp: 0,
        ..PendingOperation::new(Operation::Cattle(Mutation::Delete {
            id: EntityId::new("srv-9"),
        }))
    };
    let line = format_operation_line(&pending);
    assert!(line.contains("1970-01-01 00:00:00 UTC"));
    assert!(line.ends_with("DELETE cattle srv-9"));
}

#[test]
fn write_outcome_reflects_queue_growth() {
    let update = PendingOperation::new(Operation::Cattle(Mutation::Update {
        id: EntityId::new("srv-9"),
        changes: FieldPatch::new().with("name", "Renamed"),
    }));
    let blocked = PendingOperation::new(Operation::Milk(Mutation::Update {
        id: EntityId::new("srv-3"),
        changes: FieldPatch::new().with("cattle_id", "temp_1"),
    }));

    assert_eq!(format_write_outcome(0, &[]), "Sent to the server");
    assert_eq!(
        format_write_outcome(1, std::slice::from_ref(&update)),
        "Sent to the server"
    );
    assert_eq!(
        format_write_outcome(0, std::slice::from_ref(&update)),
        "Queued for sync"
    );
    assert_eq!(
        format_write_outcome(1, &[update, blocked]),
        "Queued for sync; waits until the records it references are synced"
    );
}

#[test]
fn last_sync_formats_never_and_timestamps() {
    assert_eq!(format_last_sync(None), "never");
    let time = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    assert_eq!(format_last_sync(Some(time)), "2023-11-14 22:13:20 UTC");
}

#[test]
fn status_lines_warn_about_degraded_persistence() {
    let item = StatusItem {
        online: false,
        status: SyncStatus {
            pending_count: 0,
            last_sync: None,
            persistence_degraded: true,
        },
        pending: Vec::new(),
    };
    let lines = format_status_lines(&item);
    assert_eq!(lines[0], "Connection: offline");
    assert_eq!(lines[2], "Last sync: never");
    assert!(lines[3].starts_with("Warning:"));
}

#[test]
fn sync_report_wording() {
    let offline = SyncReport {
        remaining: 3,
        ..SyncReport::default()
    };
    assert_eq!(
        format_sync_report(&offline),
        "Offline: 3 pending operations kept for later"
    );

    let clean = SyncReport {
        online: true,
        ..SyncReport::default()
    };
    assert_eq!(
        format_sync_report(&clean),
        "Sync completed; nothing was pending"
    );

    let partial = SyncReport {
        online: true,
        attempted: 3,
        synced: 2,
        failed: 1,
        blocked: 1,
        remaining: 2,
    };
    assert_eq!(
        format_sync_report(&partial),
        "Sync completed: 2 synced, 1 failed, 1 waiting on unsynced records, 2 pending"
    );
}

#[test]
fn config_init_updates_file_and_keeps_other_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("herd").join("config.json");

    run_config_init(
        &path,
        Some("https://farm.example.com/api/".to_string()),
        Some("secret".to_string()),
        None,
    )
    .unwrap();
    let config = run_config_init(&path, None, None, Some(30)).unwrap();

    assert_eq!(config.api_base_url(), "https://farm.example.com/api");
    assert_eq!(config.auth_token.as_deref(), Some("secret"));
    assert_eq!(config.request_timeout_secs, 30);
}

#[test]
fn config_init_rejects_invalid_url_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let result = run_config_init(&path, Some("farm.example.com".to_string()), None, None);
    assert!(result.is_err());
    assert!(!path.exists());
}

#[test]
fn config_lines_hide_token_value() {
    let dir = tempfile::tempdir().unwrap();
    let config = GatewayConfig {
        auth_token: Some("secret".to_string()),
        db_path: Some(dir.path().join("herd.db")),
        ..GatewayConfig::default()
    };
    let lines = format_config_lines(&dir.path().join("config.json"), &config).unwrap();
    assert!(lines.contains(&"Auth token: set".to_string()));
    assert!(!lines.iter().any(|line| line.contains("secret")));
}

#[test]
fn db_path_precedence() {
    let config = GatewayConfig {
        db_path: Some(PathBuf::from("/from/config.db")),
        ..GatewayConfig::default()
    };
    assert_eq!(
        resolve_db_path(Some(PathBuf::from("/from/flag.db")), &config).unwrap(),
        PathBuf::from("/from/flag.db")
    );
    assert_eq!(
        resolve_db_path(None, &config).unwrap(),
        PathBuf::from("/from/config.db")
    );
}

#[test]
fn completions_name_the_binary() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("herd"));
    let script = String::from_utf8(render_completions(CompletionShell::Fish)).unwrap();
    assert!(script.contains("complete -c herd"));
}

#[test]
fn cli_parses_list_filters() {
    let cli = Cli::try_parse_from([
        "herd",
        "--offline",
        "list",
        "milk",
        "--cattle-id",
        "srv-1",
        "--from",
        "2026-10-01",
        "--json",
    ])
    .unwrap();

    assert!(cli.offline);
    match cli.command {
        Commands::List {
            entity,
            cattle_id,
            from,
            to,
            json,
        } => {
            assert_eq!(entity, EntityArg::Milk);
            assert_eq!(cattle_id.as_deref(), Some("srv-1"));
            assert_eq!(from.as_deref(), Some("2026-10-01"));
            assert_eq!(to, None);
            assert!(json);
        }
        _ => panic!("expected list command"),
    }
}

#[test]
fn cli_parses_repeated_fields_and_aliases() {
    let cli = Cli::try_parse_from([
        "herd",
        "add",
        "expenses",
        "--field",
        "category=feed",
        "-f",
        "amount=120",
    ])
    .unwrap();

    match cli.command {
        Commands::Create { entity, payload } => {
            assert_eq!(EntityKind::from(entity), EntityKind::Expense);
            assert_eq!(payload.fields, vec!["category=feed", "amount=120"]);
            assert_eq!(payload.data, None);
        }
        _ => panic!("expected create command"),
    }
}

#[test]
fn cli_rejects_unknown_entity() {
    assert!(Cli::try_parse_from(["herd", "list", "sheep"]).is_err());
}

#[tokio::test]
async fn offline_gateway_keeps_writes_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("herd.db");
    let config = GatewayConfig::default();

    let created = {
        let gateway = open_gateway(&config, &db_path, true).await.unwrap();
        assert!(!gateway.is_online());
        let payload = build_payload(&payload_args(None, &["tag_number=GB0099", "name=Test"]))
            .unwrap();
        gateway.create(parse_entity::<Cattle>(payload).unwrap()).await
    };
    assert!(created.is_provisional());

    let gateway = open_gateway(&config, &db_path, true).await.unwrap();
    let listed = gateway.list::<Cattle>().await;
    assert_eq!(listed, vec![created]);

    let status = gateway.sync_status().await;
    assert_eq!(status.pending_count, 1);
    let report = gateway.force_sync().await;
    assert!(!report.online);
    assert_eq!(report.remaining, 1);
}

#[tokio::test]
async fn offline_delete_of_unknown_temporary_id_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = open_gateway(&GatewayConfig::default(), &dir.path().join("herd.db"), true)
        .await
        .unwrap();

    let stray = EntityId::new("temp_0000");
    let result = crate::commands::delete::run_delete(&gateway, EntityKind::Cattle, &stray).await;
    assert!(matches!(result, Err(CliError::Core(herd_core::Error::InvalidInput(_)))));
    assert_eq!(gateway.sync_status().await.pending_count, 0);
}
