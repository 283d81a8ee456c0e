//! Data models for Herd

mod cattle;
mod entity;
mod finance;
mod id;
mod mirror;
mod operation;
mod production;

pub use cattle::{Cattle, CattleStatus, Gender};
pub use entity::{Entity, EntityKind, FieldPatch, ListQuery, Record};
pub use finance::{Expense, Revenue};
pub use id::{EntityId, IdRemap, OperationId, TEMP_ID_PREFIX};
pub use mirror::{Mirror, Mirrors};
pub use operation::{Mutation, Operation, OperationType, PendingOperation};
pub use production::{Feeding, MilkProduction};
