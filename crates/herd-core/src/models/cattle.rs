//! Cattle model

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use super::mirror::{Mirror, Mirrors};
use super::operation::{Mutation, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CattleStatus {
    Active,
    Sold,
    Deceased,
    Quarantined,
}

/// An animal in the herd
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cattle {
    /// Ear tag, e.g. `GB0099`
    pub tag_number: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// Live weight in kg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<CattleStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Cattle {
    pub fn new(tag_number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tag_number: tag_number.into(),
            name: name.into(),
            breed: None,
            date_of_birth: None,
            gender: None,
            weight: None,
            health_status: None,
            location: None,
            purchase_date: None,
            purchase_price: None,
            current_status: None,
            notes: None,
        }
    }
}

impl Entity for Cattle {
    const KIND: EntityKind = EntityKind::Cattle;

    fn placeholder() -> Self {
        Self::new("", "")
    }

    fn mirror(mirrors: &Mirrors) -> &Mirror<Self> {
        &mirrors.cattle
    }

    fn mirror_mut(mirrors: &mut Mirrors) -> &mut Mirror<Self> {
        &mut mirrors.cattle
    }

    fn into_operation(mutation: Mutation<Self>) -> Operation {
        Operation::Cattle(mutation)
    }

    fn as_mutation(operation: &Operation) -> Option<&Mutation<Self>> {
        match operation {
            Operation::Cattle(mutation) => Some(mutation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_payload_round_trips_without_nulls() {
        let cattle = Cattle::new("GB0099", "Test");
        let value = serde_json::to_value(&cattle).unwrap();
        assert_eq!(value, json!({"tag_number": "GB0099", "name": "Test"}));
    }

    #[test]
    fn test_full_payload_parses() {
        let cattle: Cattle = serde_json::from_value(json!({
            "tag_number": "GB0100",
            "name": "Bella",
            "breed": "Holstein",
            "gender": "Female",
            "current_status": "Quarantined",
            "weight": 540
        }))
        .unwrap();
        assert_eq!(cattle.gender, Some(Gender::Female));
        assert_eq!(cattle.current_status, Some(CattleStatus::Quarantined));
        assert_eq!(cattle.weight, Some(540.0));
    }
}
