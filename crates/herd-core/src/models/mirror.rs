//! Local mirrors of the remote collections

use super::cattle::Cattle;
use super::entity::{Entity, EntityKind, Record};
use super::finance::{Expense, Revenue};
use super::id::{EntityId, IdRemap};
use super::production::{Feeding, MilkProduction};
use crate::error::Result;

/// One mirrored collection, newest first, ids unique
#[derive(Debug, Clone, PartialEq)]
pub struct Mirror<E> {
    records: Vec<Record<E>>,
}

impl<E> Default for Mirror<E> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<E: Entity> Mirror<E> {
    /// Build a mirror, keeping the first occurrence of each id
    pub fn from_records(records: Vec<Record<E>>) -> Self {
        let mut mirror = Self::default();
        mirror.replace_all(records);
        mirror
    }

    pub fn records(&self) -> &[Record<E>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Option<&Record<E>> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Record<E>> {
        self.records.iter_mut().find(|record| &record.id == id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Insert at the front, dropping any existing copy with the same id
    pub fn insert_front(&mut self, record: Record<E>) {
        self.records.retain(|existing| existing.id != record.id);
        self.records.insert(0, record);
    }

    /// Replace the record with the same id in place, or insert at the front
    pub fn upsert(&mut self, record: Record<E>) {
        match self.records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.insert(0, record),
        }
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<Record<E>> {
        let index = self.records.iter().position(|record| &record.id == id)?;
        Some(self.records.remove(index))
    }

    /// Swap the record stored under `old_id` for `record` (which carries its
    /// new id), keeping its position. Any other copy of the new id is dropped
    /// so exactly one live record remains.
    pub fn replace_id(&mut self, old_id: &EntityId, record: Record<E>) {
        let new_id = record.id.clone();
        match self.records.iter().position(|existing| &existing.id == old_id) {
            Some(index) => {
                self.records[index] = record;
                let mut seen = false;
                self.records.retain(|existing| {
                    if existing.id != new_id {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.upsert(record),
        }
    }

    /// Replace the whole collection, keeping the first occurrence of each id
    pub fn replace_all(&mut self, records: Vec<Record<E>>) {
        self.records.clear();
        for record in records {
            if !self.contains(&record.id) {
                self.records.push(record);
            }
        }
    }

    /// Rewrite references to remapped ids; returns whether anything changed
    pub fn remap_references(&mut self, remap: &IdRemap) -> bool {
        let mut changed = false;
        for record in &mut self.records {
            changed |= record.data.remap_references(remap);
        }
        changed
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.records)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let records: Vec<Record<E>> = serde_json::from_str(raw)?;
        Ok(Self::from_records(records))
    }
}

/// All mirrored collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mirrors {
    pub cattle: Mirror<Cattle>,
    pub milk: Mirror<MilkProduction>,
    pub feeding: Mirror<Feeding>,
    pub expenses: Mirror<Expense>,
    pub revenue: Mirror<Revenue>,
}

impl Mirrors {
    /// Serialized form of one collection
    pub fn to_json(&self, kind: EntityKind) -> Result<String> {
        match kind {
            EntityKind::Cattle => self.cattle.to_json(),
            EntityKind::Milk => self.milk.to_json(),
            EntityKind::Feeding => self.feeding.to_json(),
            EntityKind::Expense => self.expenses.to_json(),
            EntityKind::Revenue => self.revenue.to_json(),
        }
    }

    /// Replace one collection from its serialized form
    pub fn load_json(&mut self, kind: EntityKind, raw: &str) -> Result<()> {
        match kind {
            EntityKind::Cattle => self.cattle = Mirror::from_json(raw)?,
            EntityKind::Milk => self.milk = Mirror::from_json(raw)?,
            EntityKind::Feeding => self.feeding = Mirror::from_json(raw)?,
            EntityKind::Expense => self.expenses = Mirror::from_json(raw)?,
            EntityKind::Revenue => self.revenue = Mirror::from_json(raw)?,
        }
        Ok(())
    }

    /// Rewrite references in every collection; returns the kinds that changed
    pub fn remap_references(&mut self, remap: &IdRemap) -> Vec<EntityKind> {
        let mut changed = Vec::new();
        if self.cattle.remap_references(remap) {
            changed.push(EntityKind::Cattle);
        }
        if self.milk.remap_references(remap) {
            changed.push(EntityKind::Milk);
        }
        if self.feeding.remap_references(remap) {
            changed.push(EntityKind::Feeding);
        }
        if self.expenses.remap_references(remap) {
            changed.push(EntityKind::Expense);
        }
        if self.revenue.remap_references(remap) {
            changed.push(EntityKind::Revenue);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MilkProduction;

    fn cow(id: &str, name: &str) -> Record<Cattle> {
        Record {
            id: EntityId::new(id),
            data: Cattle::new(format!("GB-{id}"), name),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_insert_front_keeps_ids_unique() {
        let mut mirror = Mirror::default();
        mirror.insert_front(cow("a", "First"));
        mirror.insert_front(cow("b", "Second"));
        mirror.insert_front(cow("a", "First again"));

        assert_eq!(mirror.len(), 2);
        assert_eq!(mirror.records()[0].data.name, "First again");
        assert_eq!(mirror.records()[1].id.as_str(), "b");
    }

    #[test]
    fn test_replace_id_keeps_position_and_single_copy() {
        let temp = EntityId::temporary();
        let mut mirror = Mirror::from_records(vec![
            cow("x", "Other"),
            Record {
                id: temp.clone(),
                ..cow("unused", "Test")
            },
            cow("abc123", "Stale copy"),
        ]);

        mirror.replace_id(&temp, cow("abc123", "Test"));

        assert_eq!(mirror.len(), 2);
        assert!(!mirror.contains(&temp));
        assert_eq!(mirror.records()[1].id.as_str(), "abc123");
        assert_eq!(mirror.records()[1].data.name, "Test");
    }

    #[test]
    fn test_replace_id_inserts_when_temp_missing() {
        let mut mirror = Mirror::default();
        mirror.replace_id(&EntityId::temporary(), cow("abc123", "Test"));
        assert_eq!(mirror.len(), 1);
    }

    #[test]
    fn test_replace_all_drops_duplicate_ids() {
        let mut mirror = Mirror::default();
        mirror.replace_all(vec![cow("a", "One"), cow("a", "Dup"), cow("b", "Two")]);
        assert_eq!(mirror.len(), 2);
        assert_eq!(mirror.get(&EntityId::new("a")).unwrap().data.name, "One");
    }

    #[test]
    fn test_json_round_trip() {
        let mirror = Mirror::from_records(vec![cow("a", "One"), cow("b", "Two")]);
        let raw = mirror.to_json().unwrap();
        let restored = Mirror::<Cattle>::from_json(&raw).unwrap();
        assert_eq!(restored, mirror);
    }

    #[test]
    fn test_mirrors_remap_reports_changed_kinds() {
        let temp = EntityId::temporary();
        let mut mirrors = Mirrors::default();
        mirrors.milk.insert_front(Record::provisional(MilkProduction::new(
            temp.clone(),
            11.0,
        )));

        let mut remap = IdRemap::new();
        remap.insert(temp, EntityId::new("abc123"));

        assert_eq!(mirrors.remap_references(&remap), vec![EntityKind::Milk]);
        assert_eq!(mirrors.milk.records()[0].data.cattle_id.as_str(), "abc123");
    }
}
