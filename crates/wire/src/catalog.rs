//! Test catalog wire model.
//!
//! A catalog file lists the laboratory tests on offer:
//!
//! ```yaml
//! tests:
//!   - id: T001
//!     name: Complete Blood Count
//!     category: Hematology
//!     description: Comprehensive blood analysis
//!     duration_minutes: 45
//!     price: 2500.0
//!     requires_special_prep: false
//!     sample_kind: blood
//! ```
//!
//! `is_active` is optional and defaults to `true`.

use crate::{parse_strict, read_file, WireError, WireResult};
use lims_types::{NonEmptyText, Price};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Specimen kind a test is run against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    Blood,
    Urine,
    Saliva,
    Tissue,
    Other,
}

impl SampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Blood => "blood",
            SampleKind::Urine => "urine",
            SampleKind::Saliva => "saliva",
            SampleKind::Tissue => "tissue",
            SampleKind::Other => "other",
        }
    }
}

/// One catalog entry as read from or written to a catalog file.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntryData {
    pub id: String,
    pub name: NonEmptyText,
    pub category: NonEmptyText,
    pub description: NonEmptyText,
    pub duration_minutes: u32,
    pub price: Price,
    pub requires_special_prep: bool,
    pub sample_kind: SampleKind,
    pub is_active: bool,
}

// ============================================================================
// Public CatalogFile operations
// ============================================================================

/// Catalog file operations.
///
/// Zero-sized namespace type; all methods are associated functions.
pub struct CatalogFile;

impl CatalogFile {
    /// Parse a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Translation`] if the YAML does not match the schema (the message
    /// names the failing field), and [`WireError::InvalidInput`] if two entries share an id.
    pub fn parse(yaml_text: &str) -> WireResult<Vec<CatalogEntryData>> {
        let wire: CatalogWire = parse_strict(yaml_text, "Catalog")?;

        let mut seen = HashSet::new();
        for entry in &wire.tests {
            if !seen.insert(entry.id.as_str().to_owned()) {
                return Err(WireError::InvalidInput(format!(
                    "duplicate test id in catalog: {}",
                    entry.id
                )));
            }
        }

        Ok(wire.tests.into_iter().map(wire_to_domain).collect())
    }

    /// Read and parse a catalog file from disk.
    pub fn load(path: &Path) -> WireResult<Vec<CatalogEntryData>> {
        Self::parse(&read_file(path)?)
    }

    /// Render catalog entries as YAML text.
    pub fn render(entries: &[CatalogEntryData]) -> WireResult<String> {
        let wire = CatalogWire {
            tests: entries
                .iter()
                .map(domain_to_wire)
                .collect::<WireResult<Vec<_>>>()?,
        };
        serde_yaml::to_string(&wire)
            .map_err(|e| WireError::Translation(format!("Failed to serialize catalog: {e}")))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct CatalogWire {
    tests: Vec<CatalogEntryWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct CatalogEntryWire {
    id: NonEmptyText,
    name: NonEmptyText,
    category: NonEmptyText,
    description: NonEmptyText,
    duration_minutes: u32,
    price: Price,
    requires_special_prep: bool,
    sample_kind: SampleKind,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

fn wire_to_domain(wire: CatalogEntryWire) -> CatalogEntryData {
    CatalogEntryData {
        id: wire.id.into_inner(),
        name: wire.name,
        category: wire.category,
        description: wire.description,
        duration_minutes: wire.duration_minutes,
        price: wire.price,
        requires_special_prep: wire.requires_special_prep,
        sample_kind: wire.sample_kind,
        is_active: wire.is_active,
    }
}

fn domain_to_wire(data: &CatalogEntryData) -> WireResult<CatalogEntryWire> {
    let id = NonEmptyText::new(&data.id)
        .map_err(|e| WireError::InvalidInput(format!("catalog entry id: {e}")))?;
    Ok(CatalogEntryWire {
        id,
        name: data.name.clone(),
        category: data.category.clone(),
        description: data.description.clone(),
        duration_minutes: data.duration_minutes,
        price: data.price,
        requires_special_prep: data.requires_special_prep,
        sample_kind: data.sample_kind,
        is_active: data.is_active,
    })
}
