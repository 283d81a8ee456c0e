//! herd-core - Core library for Herd
//!
//! This crate contains the entity models and the offline-first data gateway
//! used by Herd clients: a local mirror of every entity collection, a durable
//! queue of writes the remote service has not confirmed yet, and the replay
//! logic that reconciles both once connectivity returns.

pub mod config;
pub mod connectivity;
pub mod error;
pub mod gateway;
pub mod models;
pub mod remote;
pub mod store;
pub mod util;

pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use gateway::{
    spawn_sync_on_reconnect, OfflineGateway, SyncReport, SyncStatus, SyncSubscription,
};
pub use models::{
    Cattle, Entity, EntityId, EntityKind, Expense, Feeding, FieldPatch, ListQuery,
    MilkProduction, Record, Revenue,
};
