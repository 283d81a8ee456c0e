//! Pending operations: writes the remote service has not confirmed yet

use serde::{Deserialize, Serialize};
use std::fmt;

use super::cattle::Cattle;
use super::entity::{Entity, EntityKind, FieldPatch};
use super::finance::{Expense, Revenue};
use super::id::{EntityId, IdRemap, OperationId};
use super::production::{Feeding, MilkProduction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        })
    }
}

/// The remote effect a write still has to produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mutation<E> {
    /// `temp_id` is the provisional id the record carries locally
    Create { temp_id: EntityId, payload: E },
    Update { id: EntityId, changes: FieldPatch },
    Delete { id: EntityId },
}

impl<E: Entity> Mutation<E> {
    pub const fn operation_type(&self) -> OperationType {
        match self {
            Self::Create { .. } => OperationType::Create,
            Self::Update { .. } => OperationType::Update,
            Self::Delete { .. } => OperationType::Delete,
        }
    }

    /// Id of the record the mutation targets
    pub const fn subject(&self) -> &EntityId {
        match self {
            Self::Create { temp_id, .. } => temp_id,
            Self::Update { id, .. } | Self::Delete { id } => id,
        }
    }

    /// Temporary ids that must be confirmed before this mutation can be replayed
    pub fn unresolved_references(&self) -> Vec<EntityId> {
        match self {
            Self::Create { payload, .. } => payload.temporary_references(),
            Self::Update { id, changes } => {
                let mut references = changes.temporary_references();
                if id.is_temporary() {
                    references.push(id.clone());
                }
                references
            }
            Self::Delete { id } => {
                if id.is_temporary() {
                    vec![id.clone()]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Rewrite remapped temporary ids; returns whether anything changed
    pub fn remap(&mut self, remap: &IdRemap) -> bool {
        match self {
            Self::Create { payload, .. } => payload.remap_references(remap),
            Self::Update { id, changes } => {
                let id_changed = remap.apply(id);
                changes.remap_references(remap) || id_changed
            }
            Self::Delete { id } => remap.apply(id),
        }
    }
}

/// A mutation tagged with the collection it targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "mutation", rename_all = "snake_case")]
pub enum Operation {
    Cattle(Mutation<Cattle>),
    Milk(Mutation<MilkProduction>),
    Feeding(Mutation<Feeding>),
    Expense(Mutation<Expense>),
    Revenue(Mutation<Revenue>),
}

macro_rules! each_mutation {
    ($operation:expr, $mutation:ident => $body:expr) => {
        match $operation {
            Operation::Cattle($mutation) => $body,
            Operation::Milk($mutation) => $body,
            Operation::Feeding($mutation) => $body,
            Operation::Expense($mutation) => $body,
            Operation::Revenue($mutation) => $body,
        }
    };
}

impl Operation {
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Cattle(_) => EntityKind::Cattle,
            Self::Milk(_) => EntityKind::Milk,
            Self::Feeding(_) => EntityKind::Feeding,
            Self::Expense(_) => EntityKind::Expense,
            Self::Revenue(_) => EntityKind::Revenue,
        }
    }

    pub fn operation_type(&self) -> OperationType {
        each_mutation!(self, mutation => mutation.operation_type())
    }

    pub fn subject(&self) -> &EntityId {
        each_mutation!(self, mutation => mutation.subject())
    }

    pub fn unresolved_references(&self) -> Vec<EntityId> {
        each_mutation!(self, mutation => mutation.unresolved_references())
    }

    pub fn remap(&mut self, remap: &IdRemap) -> bool {
        each_mutation!(self, mutation => mutation.remap(remap))
    }
}

/// A durably queued operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub id: OperationId,
    /// Creation time (Unix ms)
    pub timestamp: i64,
    pub operation: Operation,
}

impl PendingOperation {
    pub fn new(operation: Operation) -> Self {
        Self {
            id: OperationId::new(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_operation_wire_format() {
        let temp = EntityId::new("temp_1");
        let operation = Operation::Cattle(Mutation::Create {
            temp_id: temp,
            payload: Cattle::new("GB0099", "Test"),
        });

        let value = serde_json::to_value(&operation).unwrap();
        assert_eq!(
            value,
            json!({
                "entity": "cattle",
                "mutation": {
                    "type": "CREATE",
                    "temp_id": "temp_1",
                    "payload": {"tag_number": "GB0099", "name": "Test"}
                }
            })
        );

        let parsed: Operation = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, operation);
    }

    #[test]
    fn test_operation_accessors() {
        let operation = Operation::Expense(Mutation::Delete {
            id: EntityId::new("exp-1"),
        });
        assert_eq!(operation.kind(), EntityKind::Expense);
        assert_eq!(operation.operation_type(), OperationType::Delete);
        assert_eq!(operation.subject().as_str(), "exp-1");
    }

    #[test]
    fn test_unresolved_references() {
        let temp_cow = EntityId::temporary();

        let create_milk = Operation::Milk(Mutation::Create {
            temp_id: EntityId::temporary(),
            payload: MilkProduction::new(temp_cow.clone(), 10.0),
        });
        assert_eq!(create_milk.unresolved_references(), vec![temp_cow.clone()]);

        let create_cow = Operation::Cattle(Mutation::Create {
            temp_id: temp_cow.clone(),
            payload: Cattle::new("GB0099", "Test"),
        });
        assert!(create_cow.unresolved_references().is_empty());

        let update_cow = Operation::Cattle(Mutation::Update {
            id: temp_cow.clone(),
            changes: FieldPatch::new().with("name", "Renamed"),
        });
        assert_eq!(update_cow.unresolved_references(), vec![temp_cow]);
    }

    #[test]
    fn test_remap_updates_subject_and_payload() {
        let temp_cow = EntityId::temporary();
        let mut remap = IdRemap::new();
        remap.insert(temp_cow.clone(), EntityId::new("abc123"));

        let mut delete = Operation::Cattle(Mutation::Delete {
            id: temp_cow.clone(),
        });
        assert!(delete.remap(&remap));
        assert_eq!(delete.subject().as_str(), "abc123");

        let mut feeding = Operation::Feeding(Mutation::Create {
            temp_id: EntityId::temporary(),
            payload: Feeding::new(temp_cow, "silage", 15.0),
        });
        assert!(feeding.remap(&remap));
        assert!(feeding.unresolved_references().is_empty());
    }

    #[test]
    fn test_pending_operation_round_trip() {
        let pending = PendingOperation::new(Operation::Revenue(Mutation::Update {
            id: EntityId::new("rev-1"),
            changes: FieldPatch::new().with("amount", 120.0),
        }));
        let text = serde_json::to_string(&pending).unwrap();
        let parsed: PendingOperation = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, pending);
        assert!(parsed.timestamp > 0);
    }
}
