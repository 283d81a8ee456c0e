//! Identifiers for mirrored records and queued operations

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix that marks an id as locally generated and not yet confirmed.
pub const TEMP_ID_PREFIX: &str = "temp_";

/// Identifier of a mirrored record.
///
/// Either the id the remote service assigned, or a temporary id generated
/// while the record only exists locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap a server-assigned id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh temporary id
    #[must_use]
    pub fn temporary() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", Uuid::now_v7().simple()))
    }

    /// Whether this id was generated locally and still awaits a server id
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Some backends hand out numeric ids.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// A unique identifier for a pending operation, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Create a new unique operation ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OperationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Mapping from confirmed temporary ids to the ids the server assigned.
///
/// Persisted by the gateway so a temporary id handed out in one session still
/// resolves in the next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdRemap {
    canonical: HashMap<EntityId, EntityId>,
}

impl IdRemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `temporary` is now known as `canonical`
    pub fn insert(&mut self, temporary: EntityId, canonical: EntityId) {
        self.canonical.insert(temporary, canonical);
    }

    /// Canonical id for `id`, if it is a remapped temporary id
    pub fn get(&self, id: &EntityId) -> Option<&EntityId> {
        self.canonical.get(id)
    }

    /// Rewrite `id` in place; returns whether it changed
    pub fn apply(&self, id: &mut EntityId) -> bool {
        match self.canonical.get(id) {
            Some(canonical) => {
                *id = canonical.clone();
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_ids_are_unique_and_prefixed() {
        let first = EntityId::temporary();
        let second = EntityId::temporary();
        assert_ne!(first, second);
        assert!(first.is_temporary());
        assert!(first.as_str().starts_with(TEMP_ID_PREFIX));
    }

    #[test]
    fn test_server_id_is_not_temporary() {
        assert!(!EntityId::new("64f1c2a9e4b0a1b2c3d4e5f6").is_temporary());
    }

    #[test]
    fn test_entity_id_accepts_numbers() {
        let id: EntityId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");
        let id: EntityId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_operation_id_parse() {
        let first = OperationId::new();
        assert_ne!(first, OperationId::new());
        let parsed: OperationId = first.to_string().parse().unwrap();
        assert_eq!(parsed, first);
    }

    #[test]
    fn test_remap_rewrites_known_ids_only() {
        let temp = EntityId::temporary();
        let mut remap = IdRemap::new();
        remap.insert(temp.clone(), EntityId::new("abc123"));

        let mut target = temp;
        assert!(remap.apply(&mut target));
        assert_eq!(target.as_str(), "abc123");

        let mut untouched = EntityId::new("other");
        assert!(!remap.apply(&mut untouched));
        assert_eq!(untouched.as_str(), "other");
    }

    #[test]
    fn test_remap_persists_as_plain_object() {
        let mut remap = IdRemap::new();
        remap.insert(EntityId::new("temp_1"), EntityId::new("abc123"));

        let raw = serde_json::to_string(&remap).unwrap();
        assert_eq!(raw, r#"{"temp_1":"abc123"}"#);
        let restored: IdRemap = serde_json::from_str(&raw).unwrap();
        assert_eq!(restored, remap);
    }
}
