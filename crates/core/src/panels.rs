//! Parameter panels.
//!
//! A panel lists the measurable parameters of one catalog test. Result entry for a
//! sample is only possible when its test has a panel.

use crate::results::{ReferenceRange, TestParameter};
use lims_wire::{PanelData, ParameterData};
use serde::Serialize;
use std::collections::BTreeMap;

/// The parameters measured for one catalog test.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParameterPanel {
    pub test_id: String,
    pub parameters: Vec<TestParameter>,
}

impl From<PanelData> for ParameterPanel {
    fn from(panel: PanelData) -> Self {
        Self {
            test_id: panel.test_id.into_inner(),
            parameters: panel.parameters.into_iter().map(parameter_from_data).collect(),
        }
    }
}

fn parameter_from_data(data: ParameterData) -> TestParameter {
    TestParameter {
        id: data.id.into_inner(),
        name: data.name.into_inner(),
        unit: data.unit,
        normal_range: data.normal_range.into(),
        critical_range: data.critical_range.map(Into::into),
    }
}

/// Panels keyed by test id.
#[derive(Clone, Debug, Default)]
pub struct PanelRegistry {
    panels: BTreeMap<String, ParameterPanel>,
}

impl PanelRegistry {
    /// Registry holding the complete blood count panel for `T001`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.insert(cbc_panel());
        registry
    }

    /// Registry built from seed-file panels. Later panels replace earlier ones for the
    /// same test.
    pub fn from_panels(panels: Vec<PanelData>) -> Self {
        let mut registry = Self::default();
        for panel in panels {
            registry.insert(panel.into());
        }
        registry
    }

    pub fn insert(&mut self, panel: ParameterPanel) -> Option<ParameterPanel> {
        self.panels.insert(panel.test_id.clone(), panel)
    }

    pub fn get(&self, test_id: &str) -> Option<&ParameterPanel> {
        self.panels.get(test_id)
    }

    pub fn test_ids(&self) -> impl Iterator<Item = &str> {
        self.panels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}

fn parameter(
    id: &str,
    name: &str,
    unit: &str,
    normal: (f64, f64),
    critical: (f64, f64),
) -> TestParameter {
    TestParameter {
        id: id.to_owned(),
        name: name.to_owned(),
        unit: unit.to_owned(),
        normal_range: ReferenceRange {
            min: normal.0,
            max: normal.1,
        },
        critical_range: Some(ReferenceRange {
            min: critical.0,
            max: critical.1,
        }),
    }
}

fn cbc_panel() -> ParameterPanel {
    ParameterPanel {
        test_id: "T001".to_owned(),
        parameters: vec![
            parameter(
                "WBC",
                "White Blood Cells",
                "cells/uL",
                (4000.0, 11000.0),
                (2000.0, 20000.0),
            ),
            parameter(
                "RBC",
                "Red Blood Cells",
                "cells/uL",
                (4.2e6, 5.4e6),
                (3.0e6, 7.0e6),
            ),
            parameter("HGB", "Hemoglobin", "g/dL", (12.0, 15.5), (7.0, 20.0)),
            parameter("HCT", "Hematocrit", "%", (36.0, 46.0), (20.0, 60.0)),
            parameter(
                "PLT",
                "Platelets",
                "cells/uL",
                (150_000.0, 450_000.0),
                (50_000.0, 1_000_000.0),
            ),
        ],
    }
}
