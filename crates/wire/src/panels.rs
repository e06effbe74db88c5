//! Parameter panel wire model.
//!
//! A panel lists the measurable parameters of one catalog test together with their
//! reference ranges:
//!
//! ```yaml
//! panels:
//!   - test_id: T001
//!     parameters:
//!       - id: WBC
//!         name: White Blood Cells
//!         unit: cells/uL
//!         normal_range: { min: 4000, max: 11000 }
//!         critical_range: { min: 2000, max: 20000 }
//! ```
//!
//! `critical_range` is optional. Every range must satisfy `min <= max`.

use crate::{parse_strict, read_file, WireError, WireResult};
use lims_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Closed numeric interval `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeData {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterData {
    pub id: NonEmptyText,
    pub name: NonEmptyText,
    pub unit: String,
    pub normal_range: RangeData,
    pub critical_range: Option<RangeData>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanelData {
    pub test_id: NonEmptyText,
    pub parameters: Vec<ParameterData>,
}

/// Panel file operations.
pub struct PanelFile;

impl PanelFile {
    /// Parse panels from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Translation`] on schema mismatch and [`WireError::InvalidInput`]
    /// for inverted ranges, duplicate panels or duplicate parameter ids within a panel.
    pub fn parse(yaml_text: &str) -> WireResult<Vec<PanelData>> {
        let wire: PanelsWire = parse_strict(yaml_text, "Panel")?;
        let mut seen = HashSet::new();
        let mut panels = Vec::with_capacity(wire.panels.len());

        for panel in wire.panels {
            if !seen.insert(panel.test_id.as_str().to_owned()) {
                return Err(WireError::InvalidInput(format!(
                    "duplicate panel for test {}",
                    panel.test_id
                )));
            }
            panels.push(wire_to_domain(panel)?);
        }

        Ok(panels)
    }

    pub fn load(path: &Path) -> WireResult<Vec<PanelData>> {
        Self::parse(&read_file(path)?)
    }

    pub fn render(panels: &[PanelData]) -> WireResult<String> {
        let wire = PanelsWire {
            panels: panels.iter().map(domain_to_wire).collect(),
        };
        serde_yaml::to_string(&wire)
            .map_err(|e| WireError::Translation(format!("Failed to serialize panels: {e}")))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct PanelsWire {
    panels: Vec<PanelWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct PanelWire {
    test_id: NonEmptyText,
    parameters: Vec<ParameterWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ParameterWire {
    id: NonEmptyText,
    name: NonEmptyText,
    #[serde(default)]
    unit: String,
    normal_range: RangeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    critical_range: Option<RangeData>,
}

fn check_range(test_id: &str, parameter_id: &str, label: &str, range: RangeData) -> WireResult<()> {
    if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
        return Err(WireError::InvalidInput(format!(
            "{label} range of {test_id}/{parameter_id} must be finite with min <= max (got {} - {})",
            range.min, range.max
        )));
    }
    Ok(())
}

fn wire_to_domain(wire: PanelWire) -> WireResult<PanelData> {
    let mut seen = HashSet::new();
    let mut parameters = Vec::with_capacity(wire.parameters.len());

    for p in wire.parameters {
        if !seen.insert(p.id.as_str().to_owned()) {
            return Err(WireError::InvalidInput(format!(
                "duplicate parameter {} in panel {}",
                p.id, wire.test_id
            )));
        }
        check_range(wire.test_id.as_str(), p.id.as_str(), "normal", p.normal_range)?;
        if let Some(critical) = p.critical_range {
            check_range(wire.test_id.as_str(), p.id.as_str(), "critical", critical)?;
        }
        parameters.push(ParameterData {
            id: p.id,
            name: p.name,
            unit: p.unit,
            normal_range: p.normal_range,
            critical_range: p.critical_range,
        });
    }

    Ok(PanelData {
        test_id: wire.test_id,
        parameters,
    })
}

fn domain_to_wire(data: &PanelData) -> PanelWire {
    PanelWire {
        test_id: data.test_id.clone(),
        parameters: data
            .parameters
            .iter()
            .map(|p| ParameterWire {
                id: p.id.clone(),
                name: p.name.clone(),
                unit: p.unit.clone(),
                normal_range: p.normal_range,
                critical_range: p.critical_range,
            })
            .collect(),
    }
}
