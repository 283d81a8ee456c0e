//! Entity kinds, mirrored records and the `Entity` trait

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::id::{EntityId, IdRemap};
use super::mirror::{Mirror, Mirrors};
use super::operation::{Mutation, Operation};
use crate::error::{Error, Result};

/// The collections the gateway mirrors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Cattle,
    Milk,
    Feeding,
    Expense,
    Revenue,
}

impl EntityKind {
    /// Every kind, in refresh order (cattle first so references resolve)
    pub const ALL: [Self; 5] = [
        Self::Cattle,
        Self::Milk,
        Self::Feeding,
        Self::Expense,
        Self::Revenue,
    ];

    /// REST collection path relative to the API base URL
    pub const fn collection_path(self) -> &'static str {
        match self {
            Self::Cattle => "cattle",
            Self::Milk => "milk",
            Self::Feeding => "feeding",
            Self::Expense => "financial/expenses",
            Self::Revenue => "financial/revenue",
        }
    }

    /// Key of the mirrored collection in the local store
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Cattle => "offline_cattle",
            Self::Milk => "offline_milk",
            Self::Feeding => "offline_feeding",
            Self::Expense => "offline_expenses",
            Self::Revenue => "offline_revenue",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cattle => "cattle",
            Self::Milk => "milk",
            Self::Feeding => "feeding",
            Self::Expense => "expense",
            Self::Revenue => "revenue",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cattle" => Ok(Self::Cattle),
            "milk" | "milk-production" | "milk_production" => Ok(Self::Milk),
            "feeding" | "feedings" => Ok(Self::Feeding),
            "expense" | "expenses" => Ok(Self::Expense),
            "revenue" | "revenues" => Ok(Self::Revenue),
            other => Err(Error::InvalidInput(format!("Unknown entity type: {other}"))),
        }
    }
}

/// A field set the gateway can mirror and replay.
///
/// Implemented by each domain type. The associated functions route a typed
/// value to its mirror and to its variant of [`Operation`], so that replay
/// dispatch stays exhaustive.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    /// Smallest well-typed value; patches for records missing from the
    /// mirror are checked against it
    fn placeholder() -> Self;

    fn mirror(mirrors: &Mirrors) -> &Mirror<Self>;

    fn mirror_mut(mirrors: &mut Mirrors) -> &mut Mirror<Self>;

    fn into_operation(mutation: Mutation<Self>) -> Operation;

    /// The mutation inside `operation` when it targets this collection
    fn as_mutation(operation: &Operation) -> Option<&Mutation<Self>>;

    /// The cattle record this entry belongs to, for per-animal records
    fn cattle_id(&self) -> Option<&EntityId> {
        None
    }

    fn cattle_id_mut(&mut self) -> Option<&mut EntityId> {
        None
    }

    /// Recording date (`YYYY-MM-DD` prefix), used for local date filters
    fn date_recorded(&self) -> Option<&str> {
        None
    }

    /// Temporary ids this value points at
    fn temporary_references(&self) -> Vec<EntityId> {
        self.cattle_id()
            .filter(|id| id.is_temporary())
            .cloned()
            .into_iter()
            .collect()
    }

    /// Rewrite references to remapped temporary ids; returns whether anything changed
    fn remap_references(&mut self, remap: &IdRemap) -> bool {
        self.cattle_id_mut().is_some_and(|id| remap.apply(id))
    }

    /// Whether this value passes the filters of `query`
    fn matches(&self, query: &ListQuery) -> bool {
        let cattle_matches = query
            .cattle_id
            .as_ref()
            .is_none_or(|wanted| self.cattle_id() == Some(wanted));
        cattle_matches && query.date_in_range(self.date_recorded())
    }
}

/// A mirrored record: id, typed field set, local timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<E> {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(flatten)]
    pub data: E,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl<E: Entity> Record<E> {
    /// A provisional record with a fresh temporary id
    pub fn provisional(data: E) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::temporary(),
            data,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Whether the record still awaits its server id
    pub fn is_provisional(&self) -> bool {
        self.id.is_temporary()
    }

    /// Merge `patch` into the field set and bump `updated_at`
    pub fn apply_patch(&mut self, patch: &FieldPatch) -> Result<()> {
        self.data = patch.apply_to(&self.data)?;
        self.updated_at = Some(Utc::now());
        Ok(())
    }
}

/// Fields to merge into an existing record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPatch(Map<String, Value>);

/// Keys owned by the record envelope rather than the field set
const ENVELOPE_KEYS: [&str; 6] = [
    "_id",
    "id",
    "created_at",
    "updated_at",
    "createdAt",
    "updatedAt",
];

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a patch from a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::InvalidInput(format!(
                "Patch must be a JSON object, got {other}"
            ))),
        }
    }

    /// Set a single field
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Produce `data` with this patch merged in.
    ///
    /// Fails when the merged object no longer fits the entity's field types.
    pub fn apply_to<E: Entity>(&self, data: &E) -> Result<E> {
        let mut merged = match serde_json::to_value(data)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in &self.0 {
            if ENVELOPE_KEYS.contains(&key.as_str()) {
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(merged)).map_err(|error| {
            Error::InvalidInput(format!("Patch does not fit {}: {error}", E::KIND))
        })
    }

    /// Check that every field fits `E` without a stored record to merge into
    pub fn check_fits<E: Entity>(&self) -> Result<()> {
        self.apply_to(&E::placeholder()).map(|_| ())
    }

    /// Temporary ids referenced through `cattle_id`
    pub fn temporary_references(&self) -> Vec<EntityId> {
        match self.0.get("cattle_id") {
            Some(Value::String(id)) => {
                let id = EntityId::new(id.clone());
                if id.is_temporary() {
                    vec![id]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    /// Rewrite a remapped `cattle_id`; returns whether anything changed
    pub fn remap_references(&mut self, remap: &IdRemap) -> bool {
        let Some(Value::String(id)) = self.0.get_mut("cattle_id") else {
            return false;
        };
        match remap.get(&EntityId::new(id.clone())) {
            Some(canonical) => {
                *id = canonical.to_string();
                true
            }
            None => false,
        }
    }
}

/// Filters for list reads, passed through to the remote service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cattle_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListQuery {
    /// True when the query asks for the whole collection
    pub const fn is_unfiltered(&self) -> bool {
        self.cattle_id.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.page.is_none()
            && self.limit.is_none()
    }

    /// Query-string pairs for the REST call
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(cattle_id) = &self.cattle_id {
            pairs.push(("cattle_id", cattle_id.to_string()));
        }
        if let Some(date_from) = &self.date_from {
            pairs.push(("date_from", date_from.clone()));
        }
        if let Some(date_to) = &self.date_to {
            pairs.push(("date_to", date_to.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }

    /// Inclusive date-range check on a `YYYY-MM-DD...` string
    pub fn date_in_range(&self, date: Option<&str>) -> bool {
        let from = self.date_from.as_deref().and_then(parse_date_prefix);
        let to = self.date_to.as_deref().and_then(parse_date_prefix);
        if from.is_none() && to.is_none() {
            return true;
        }
        let Some(date) = date.and_then(parse_date_prefix) else {
            return false;
        };
        from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
    }
}

fn parse_date_prefix(value: &str) -> Option<NaiveDate> {
    let prefix = value.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cattle, MilkProduction};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_entity_kind_parse_aliases() {
        assert_eq!("cattle".parse::<EntityKind>().unwrap(), EntityKind::Cattle);
        assert_eq!("Expenses".parse::<EntityKind>().unwrap(), EntityKind::Expense);
        assert_eq!("milk".parse::<EntityKind>().unwrap(), EntityKind::Milk);
        assert!("goats".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_entity_kind_paths() {
        assert_eq!(EntityKind::Expense.collection_path(), "financial/expenses");
        assert_eq!(EntityKind::Revenue.storage_key(), "offline_revenue");
    }

    #[test]
    fn test_record_parses_server_representation() {
        let record: Record<Cattle> = serde_json::from_value(json!({
            "_id": "abc123",
            "tag_number": "GB0099",
            "name": "Test",
            "__v": 0,
            "createdAt": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(record.id.as_str(), "abc123");
        assert_eq!(record.data.tag_number, "GB0099");
        assert!(record.created_at.is_some());
        assert!(record.updated_at.is_none());
        assert!(!record.is_provisional());
    }

    #[test]
    fn test_record_accepts_plain_id_field() {
        let record: Record<Cattle> = serde_json::from_value(json!({
            "id": 7,
            "tag_number": "GB0001",
            "name": "Daisy"
        }))
        .unwrap();
        assert_eq!(record.id.as_str(), "7");
    }

    #[test]
    fn test_patch_merges_fields() {
        let cattle = Cattle::new("GB0099", "Test");
        let patch = FieldPatch::new()
            .with("name", "Renamed")
            .with("weight", 412.5)
            .with("_id", "ignored");

        let merged = patch.apply_to(&cattle).unwrap();
        assert_eq!(merged.name, "Renamed");
        assert_eq!(merged.weight, Some(412.5));
        assert_eq!(merged.tag_number, "GB0099");
    }

    #[test]
    fn test_patch_with_wrong_type_is_rejected() {
        let cattle = Cattle::new("GB0099", "Test");
        let patch = FieldPatch::new().with("weight", "heavy");
        assert!(matches!(
            patch.apply_to(&cattle),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_patch_checked_without_record() {
        assert!(FieldPatch::new()
            .with("weight", 512.5)
            .check_fits::<Cattle>()
            .is_ok());
        assert!(matches!(
            FieldPatch::new().with("weight", "heavy").check_fits::<Cattle>(),
            Err(Error::InvalidInput(_))
        ));
        assert!(FieldPatch::new()
            .with("quantity_liters", "lots")
            .check_fits::<MilkProduction>()
            .is_err());
    }

    #[test]
    fn test_patch_from_value_requires_object() {
        assert!(FieldPatch::from_value(json!([1, 2])).is_err());
        assert!(FieldPatch::from_value(json!({"name": "x"})).is_ok());
    }

    #[test]
    fn test_patch_remaps_cattle_reference() {
        let temp = EntityId::temporary();
        let mut patch = FieldPatch::new().with("cattle_id", temp.to_string());
        assert_eq!(patch.temporary_references(), vec![temp.clone()]);

        let mut remap = IdRemap::new();
        remap.insert(temp, EntityId::new("abc123"));
        assert!(patch.remap_references(&remap));
        assert_eq!(patch.fields()["cattle_id"], json!("abc123"));
        assert!(patch.temporary_references().is_empty());
    }

    #[test]
    fn test_query_pairs_and_unfiltered() {
        assert!(ListQuery::default().is_unfiltered());

        let query = ListQuery {
            cattle_id: Some(EntityId::new("abc")),
            date_from: Some("2024-01-01".to_string()),
            ..ListQuery::default()
        };
        assert!(!query.is_unfiltered());
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("cattle_id", "abc".to_string()),
                ("date_from", "2024-01-01".to_string())
            ]
        );
    }

    #[test]
    fn test_local_filter_matching() {
        let mut milk = MilkProduction::new(EntityId::new("cow-1"), 12.0);
        milk.date_recorded = Some("2024-03-15T06:00:00.000Z".to_string());

        let query = ListQuery {
            cattle_id: Some(EntityId::new("cow-1")),
            date_from: Some("2024-03-01".to_string()),
            date_to: Some("2024-03-15".to_string()),
            ..ListQuery::default()
        };
        assert!(milk.matches(&query));

        let other_cow = ListQuery {
            cattle_id: Some(EntityId::new("cow-2")),
            ..ListQuery::default()
        };
        assert!(!milk.matches(&other_cow));

        let too_late = ListQuery {
            date_from: Some("2024-04-01".to_string()),
            ..ListQuery::default()
        };
        assert!(!milk.matches(&too_late));
    }
}
