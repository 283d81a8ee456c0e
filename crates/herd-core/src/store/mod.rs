//! Local persistent key-value store
//!
//! The gateway persists each mirrored collection, the pending-operation queue,
//! the confirmed temporary ids and the last-sync timestamp as text under fixed
//! keys.

mod memory;
mod sqlite;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key of the pending-operation queue
pub const PENDING_OPERATIONS_KEY: &str = "pending_sync_operations";

/// Key of the last successful sync time (Unix ms, decimal text)
pub const LAST_SYNC_KEY: &str = "last_sync_timestamp";

/// Key of the confirmed temporary id table (JSON object, temporary → server id)
pub const ID_REMAP_KEY: &str = "confirmed_temp_ids";

/// Durable string store owned by the gateway
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write several values together.
    ///
    /// Implementations that can should make the batch atomic.
    async fn set_many(&self, entries: &[(String, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }
}
