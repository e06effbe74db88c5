//! Test catalog store.
//!
//! Holds the laboratory's test definitions in insertion order. Ids are sequential
//! (`T001`, `T002`, ...) and are never reused, even after a delete.
//!
//! Deleting here does not look at samples; [`crate::LabStore::delete_test`] is the
//! checked variant.

use crate::constants::{SEQUENTIAL_ID_WIDTH, TEST_ID_PREFIX};
use chrono::{DateTime, Utc};
use lims_ids::SequentialIdGenerator;
use lims_types::{NonEmptyText, Price};
use lims_wire::{CatalogEntryData, SampleKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: String,
    pub name: NonEmptyText,
    pub category: NonEmptyText,
    pub description: NonEmptyText,
    pub duration_minutes: u32,
    pub price: Price,
    pub requires_special_prep: bool,
    pub sample_kind: SampleKind,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A test definition before it has been assigned an id.
#[derive(Clone, Debug, Deserialize)]
pub struct NewTestDefinition {
    pub name: NonEmptyText,
    pub category: NonEmptyText,
    pub description: NonEmptyText,
    pub duration_minutes: u32,
    pub price: Price,
    #[serde(default)]
    pub requires_special_prep: bool,
    pub sample_kind: SampleKind,
}

/// Field-wise merge for [`CatalogStore::update`]. The id itself cannot be patched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestDefinitionPatch {
    pub name: Option<NonEmptyText>,
    pub category: Option<NonEmptyText>,
    pub description: Option<NonEmptyText>,
    pub duration_minutes: Option<u32>,
    pub price: Option<Price>,
    pub requires_special_prep: Option<bool>,
    pub sample_kind: Option<SampleKind>,
    pub is_active: Option<bool>,
}

impl TestDefinitionPatch {
    fn apply(self, def: &mut TestDefinition) {
        if let Some(v) = self.name {
            def.name = v;
        }
        if let Some(v) = self.category {
            def.category = v;
        }
        if let Some(v) = self.description {
            def.description = v;
        }
        if let Some(v) = self.duration_minutes {
            def.duration_minutes = v;
        }
        if let Some(v) = self.price {
            def.price = v;
        }
        if let Some(v) = self.requires_special_prep {
            def.requires_special_prep = v;
        }
        if let Some(v) = self.sample_kind {
            def.sample_kind = v;
        }
        if let Some(v) = self.is_active {
            def.is_active = v;
        }
    }
}

#[derive(Clone, Debug)]
pub struct CatalogStore {
    tests: Vec<TestDefinition>,
    ids: SequentialIdGenerator,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl CatalogStore {
    pub fn empty() -> Self {
        Self {
            tests: Vec::new(),
            ids: SequentialIdGenerator::new(TEST_ID_PREFIX, SEQUENTIAL_ID_WIDTH),
        }
    }

    /// The built-in catalog: complete blood count, lipid panel and urinalysis.
    pub fn with_defaults() -> Self {
        Self::from_entries(default_entries())
    }

    /// Build a catalog from seed entries, keeping their ids.
    pub fn from_entries(entries: Vec<CatalogEntryData>) -> Self {
        let now = Utc::now();
        let mut store = Self::empty();
        for entry in entries {
            store.ids.observe(&entry.id);
            store.tests.push(TestDefinition {
                id: entry.id,
                name: entry.name,
                category: entry.category,
                description: entry.description,
                duration_minutes: entry.duration_minutes,
                price: entry.price,
                requires_special_prep: entry.requires_special_prep,
                sample_kind: entry.sample_kind,
                is_active: entry.is_active,
                created_at: now,
                updated_at: now,
            });
        }
        store
    }

    pub fn list(&self) -> &[TestDefinition] {
        &self.tests
    }

    pub fn get(&self, id: &str) -> Option<&TestDefinition> {
        self.tests.iter().find(|t| t.id == id)
    }

    pub fn add(&mut self, new: NewTestDefinition) -> TestDefinition {
        let now = Utc::now();
        let def = TestDefinition {
            id: self.ids.next_id(),
            name: new.name,
            category: new.category,
            description: new.description,
            duration_minutes: new.duration_minutes,
            price: new.price,
            requires_special_prep: new.requires_special_prep,
            sample_kind: new.sample_kind,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tracing::info!(test_id = %def.id, name = %def.name, "test added to catalog");
        self.tests.push(def.clone());
        def
    }

    /// Merge `patch` into the definition. Returns `None` if the id is unknown.
    pub fn update(&mut self, id: &str, patch: TestDefinitionPatch) -> Option<TestDefinition> {
        let def = self.tests.iter_mut().find(|t| t.id == id)?;
        patch.apply(def);
        def.updated_at = Utc::now();
        Some(def.clone())
    }

    /// Remove the definition. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(idx) = self.tests.iter().position(|t| t.id == id) else {
            return false;
        };
        self.tests.remove(idx);
        tracing::info!(test_id = id, "test removed from catalog");
        true
    }

    pub fn toggle_active(&mut self, id: &str) -> Option<TestDefinition> {
        let def = self.tests.iter_mut().find(|t| t.id == id)?;
        def.is_active = !def.is_active;
        def.updated_at = Utc::now();
        Some(def.clone())
    }

    /// Export the catalog in seed-file form.
    pub fn entries(&self) -> Vec<CatalogEntryData> {
        self.tests
            .iter()
            .map(|t| CatalogEntryData {
                id: t.id.clone(),
                name: t.name.clone(),
                category: t.category.clone(),
                description: t.description.clone(),
                duration_minutes: t.duration_minutes,
                price: t.price,
                requires_special_prep: t.requires_special_prep,
                sample_kind: t.sample_kind,
                is_active: t.is_active,
            })
            .collect()
    }
}

type DefaultTest = (&'static str, &'static str, &'static str, &'static str, u32, f64, bool, SampleKind);

const DEFAULT_TESTS: [DefaultTest; 3] = [
    (
        "T001",
        "Complete Blood Count",
        "Hematology",
        "Comprehensive blood analysis",
        45,
        2500.00,
        false,
        SampleKind::Blood,
    ),
    (
        "T002",
        "Lipid Panel",
        "Chemistry",
        "Cholesterol analysis",
        60,
        3500.00,
        true,
        SampleKind::Blood,
    ),
    (
        "T003",
        "Urinalysis",
        "Urinalysis",
        "Complete urine examination",
        30,
        1500.00,
        false,
        SampleKind::Urine,
    ),
];

fn default_entries() -> Vec<CatalogEntryData> {
    DEFAULT_TESTS
        .iter()
        .filter_map(
            |&(id, name, category, description, duration_minutes, price, prep, kind)| {
                Some(CatalogEntryData {
                    id: id.to_owned(),
                    name: NonEmptyText::new(name).ok()?,
                    category: NonEmptyText::new(category).ok()?,
                    description: NonEmptyText::new(description).ok()?,
                    duration_minutes,
                    price: Price::new(price).ok()?,
                    requires_special_prep: prep,
                    sample_kind: kind,
                    is_active: true,
                })
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn new_test(name: &str) -> NewTestDefinition {
        NewTestDefinition {
            name: NonEmptyText::new(name).unwrap(),
            category: NonEmptyText::new("Chemistry").unwrap(),
            description: NonEmptyText::new("Fasting glucose").unwrap(),
            duration_minutes: 20,
            price: Price::new(800.0).unwrap(),
            requires_special_prep: true,
            sample_kind: SampleKind::Blood,
        }
    }

    #[test]
    fn defaults_are_listed_in_order() {
        let catalog = CatalogStore::with_defaults();
        let ids: Vec<&str> = catalog.list().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["T001", "T002", "T003"]);
        assert!(catalog.list().iter().all(|t| t.is_active));
    }

    #[test]
    fn add_assigns_next_sequential_id() {
        let mut catalog = CatalogStore::with_defaults();
        let added = catalog.add(new_test("Glucose"));
        assert_eq!(added.id, "T004");
        assert_eq!(catalog.list().last(), Some(&added));
    }

    #[test]
    fn add_after_delete_does_not_reuse_ids() {
        let mut catalog = CatalogStore::with_defaults();
        assert!(catalog.delete("T003"));
        let added = catalog.add(new_test("Glucose"));
        assert_eq!(added.id, "T004");

        let ids: HashSet<&str> = catalog.list().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.list().len());
    }

    #[test]
    fn delete_is_not_repeatable() {
        let mut catalog = CatalogStore::with_defaults();
        assert!(catalog.delete("T001"));
        assert!(catalog.list().iter().all(|t| t.id != "T001"));
        assert!(!catalog.delete("T001"));
        assert_eq!(catalog.list().len(), 2);
    }

    #[test]
    fn update_merges_given_fields() {
        let mut catalog = CatalogStore::with_defaults();
        let updated = catalog
            .update(
                "T002",
                TestDefinitionPatch {
                    price: Some(Price::new(3900.0).unwrap()),
                    ..TestDefinitionPatch::default()
                },
            )
            .expect("T002 exists");
        assert_eq!(updated.price.amount(), 3900.0);
        assert_eq!(updated.name.as_str(), "Lipid Panel");
        assert_eq!(catalog.get("T002"), Some(&updated));
    }

    #[test]
    fn update_unknown_id_returns_none_and_changes_nothing() {
        let mut catalog = CatalogStore::with_defaults();
        let before = catalog.list().to_vec();
        let patch = TestDefinitionPatch {
            is_active: Some(false),
            ..TestDefinitionPatch::default()
        };
        assert!(catalog.update("T999", patch).is_none());
        assert_eq!(catalog.list(), before.as_slice());
    }

    #[test]
    fn toggle_active_flips_flag() {
        let mut catalog = CatalogStore::with_defaults();
        assert!(!catalog.toggle_active("T001").unwrap().is_active);
        assert!(catalog.toggle_active("T001").unwrap().is_active);
        assert!(catalog.toggle_active("T404").is_none());
    }

    #[test]
    fn seeded_ids_advance_generator() {
        let mut entries = CatalogStore::with_defaults().entries();
        entries[2].id = "T010".to_owned();
        let mut catalog = CatalogStore::from_entries(entries);
        assert_eq!(catalog.add(new_test("Glucose")).id, "T011");
    }

    #[test]
    fn new_test_deserialize_requires_name() {
        let json = r#"{"name":"  ","category":"Chemistry","description":"d","duration_minutes":5,"price":1.0,"sample_kind":"blood"}"#;
        assert!(serde_json::from_str::<NewTestDefinition>(json).is_err());
    }

    #[test]
    fn patch_cannot_change_id() {
        let err = serde_json::from_str::<TestDefinitionPatch>(r#"{"id":"T777"}"#).unwrap_err();
        assert!(err.to_string().contains("id"));
    }
}
