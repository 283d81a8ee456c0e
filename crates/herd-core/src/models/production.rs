//! Per-animal production records: milk yields and feedings

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use super::id::EntityId;
use super::mirror::{Mirror, Mirrors};
use super::operation::{Mutation, Operation};

/// A milk yield for one animal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilkProduction {
    pub cattle_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_recorded: Option<String>,
    #[serde(default)]
    pub quantity_liters: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MilkProduction {
    pub const fn new(cattle_id: EntityId, quantity_liters: f64) -> Self {
        Self {
            cattle_id,
            date_recorded: None,
            quantity_liters,
            quality_score: None,
            notes: None,
        }
    }
}

impl Entity for MilkProduction {
    const KIND: EntityKind = EntityKind::Milk;

    fn placeholder() -> Self {
        Self::new(EntityId::new(""), 0.0)
    }

    fn mirror(mirrors: &Mirrors) -> &Mirror<Self> {
        &mirrors.milk
    }

    fn mirror_mut(mirrors: &mut Mirrors) -> &mut Mirror<Self> {
        &mut mirrors.milk
    }

    fn into_operation(mutation: Mutation<Self>) -> Operation {
        Operation::Milk(mutation)
    }

    fn as_mutation(operation: &Operation) -> Option<&Mutation<Self>> {
        match operation {
            Operation::Milk(mutation) => Some(mutation),
            _ => None,
        }
    }

    fn cattle_id(&self) -> Option<&EntityId> {
        Some(&self.cattle_id)
    }

    fn cattle_id_mut(&mut self) -> Option<&mut EntityId> {
        Some(&mut self.cattle_id)
    }

    fn date_recorded(&self) -> Option<&str> {
        self.date_recorded.as_deref()
    }
}

/// A feed ration given to one animal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feeding {
    pub cattle_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_recorded: Option<String>,
    #[serde(default)]
    pub feed_type: String,
    #[serde(default)]
    pub quantity_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_unit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Feeding {
    pub fn new(cattle_id: EntityId, feed_type: impl Into<String>, quantity_kg: f64) -> Self {
        Self {
            cattle_id,
            date_recorded: None,
            feed_type: feed_type.into(),
            quantity_kg,
            cost_per_unit: None,
            total_cost: None,
            supplier: None,
            notes: None,
        }
    }
}

impl Entity for Feeding {
    const KIND: EntityKind = EntityKind::Feeding;

    fn placeholder() -> Self {
        Self::new(EntityId::new(""), "", 0.0)
    }

    fn mirror(mirrors: &Mirrors) -> &Mirror<Self> {
        &mirrors.feeding
    }

    fn mirror_mut(mirrors: &mut Mirrors) -> &mut Mirror<Self> {
        &mut mirrors.feeding
    }

    fn into_operation(mutation: Mutation<Self>) -> Operation {
        Operation::Feeding(mutation)
    }

    fn as_mutation(operation: &Operation) -> Option<&Mutation<Self>> {
        match operation {
            Operation::Feeding(mutation) => Some(mutation),
            _ => None,
        }
    }

    fn cattle_id(&self) -> Option<&EntityId> {
        Some(&self.cattle_id)
    }

    fn cattle_id_mut(&mut self) -> Option<&mut EntityId> {
        Some(&mut self.cattle_id)
    }

    fn date_recorded(&self) -> Option<&str> {
        self.date_recorded.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdRemap;

    #[test]
    fn test_temporary_cattle_reference_is_reported() {
        let temp = EntityId::temporary();
        let milk = MilkProduction::new(temp.clone(), 8.5);
        assert_eq!(milk.temporary_references(), vec![temp]);

        let confirmed = MilkProduction::new(EntityId::new("abc123"), 8.5);
        assert!(confirmed.temporary_references().is_empty());
    }

    #[test]
    fn test_remap_rewrites_cattle_reference() {
        let temp = EntityId::temporary();
        let mut feeding = Feeding::new(temp.clone(), "hay", 20.0);
        let mut remap = IdRemap::new();
        remap.insert(temp, EntityId::new("abc123"));

        assert!(feeding.remap_references(&remap));
        assert_eq!(feeding.cattle_id.as_str(), "abc123");
        assert!(!feeding.remap_references(&remap));
    }
}
