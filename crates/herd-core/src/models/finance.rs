//! Farm expenses and revenue

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use super::mirror::{Mirror, Mirrors};
use super::operation::{Mutation, Operation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_recorded: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Expense {
    pub fn new(category: impl Into<String>, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date_recorded: None,
            category: category.into(),
            description: description.into(),
            amount,
            supplier: None,
            receipt_number: None,
            notes: None,
        }
    }
}

impl Entity for Expense {
    const KIND: EntityKind = EntityKind::Expense;

    fn placeholder() -> Self {
        Self::new("", "", 0.0)
    }

    fn mirror(mirrors: &Mirrors) -> &Mirror<Self> {
        &mirrors.expenses
    }

    fn mirror_mut(mirrors: &mut Mirrors) -> &mut Mirror<Self> {
        &mut mirrors.expenses
    }

    fn into_operation(mutation: Mutation<Self>) -> Operation {
        Operation::Expense(mutation)
    }

    fn as_mutation(operation: &Operation) -> Option<&Mutation<Self>> {
        match operation {
            Operation::Expense(mutation) => Some(mutation),
            _ => None,
        }
    }

    fn date_recorded(&self) -> Option<&str> {
        self.date_recorded.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revenue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_recorded: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Revenue {
    pub fn new(source: impl Into<String>, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date_recorded: None,
            source: source.into(),
            description: description.into(),
            amount,
            notes: None,
        }
    }
}

impl Entity for Revenue {
    const KIND: EntityKind = EntityKind::Revenue;

    fn placeholder() -> Self {
        Self::new("", "", 0.0)
    }

    fn mirror(mirrors: &Mirrors) -> &Mirror<Self> {
        &mirrors.revenue
    }

    fn mirror_mut(mirrors: &mut Mirrors) -> &mut Mirror<Self> {
        &mut mirrors.revenue
    }

    fn into_operation(mutation: Mutation<Self>) -> Operation {
        Operation::Revenue(mutation)
    }

    fn as_mutation(operation: &Operation) -> Option<&Mutation<Self>> {
        match operation {
            Operation::Revenue(mutation) => Some(mutation),
            _ => None,
        }
    }

    fn date_recorded(&self) -> Option<&str> {
        self.date_recorded.as_deref()
    }
}
