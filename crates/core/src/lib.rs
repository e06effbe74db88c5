//! # LIMS Core
//!
//! State and workflow logic for a clinical laboratory:
//! - test catalog, patient register and sample tracking
//! - classification of measured values against reference ranges
//! - result entry, submission and review
//! - the sample lifecycle (`received -> processing -> completed -> archived`)
//! - reagent inventory and equipment maintenance
//! - role-based view dispatch and dashboard counters
//! - report templates rendered as plain text
//!
//! All data is held in memory. [`LabStore`] is the entry point; it is built from a
//! [`CoreConfig`] resolved once at startup.
//!
//! **No API concerns**: HTTP servers and command-line handling live in the binaries.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod equipment;
pub mod error;
pub mod inventory;
pub mod panels;
pub mod patients;
pub mod reports;
pub mod results;
pub mod roles;
pub mod samples;
pub mod store;
pub mod summary;
pub mod workflow;

pub use catalog::{CatalogStore, NewTestDefinition, TestDefinition, TestDefinitionPatch};
pub use config::{seed_file_from_env_value, transition_policy_from_env_value, CoreConfig};
pub use equipment::{
    Equipment, EquipmentStats, EquipmentStatus, EquipmentStore, MaintenanceKind,
    MaintenanceRecord, NewEquipment,
};
pub use error::{LabError, LabResult};
pub use inventory::{
    InventoryCategory, InventoryItem, InventoryStats, InventoryStore, NewInventoryItem,
    StockStatus,
};
pub use panels::{PanelRegistry, ParameterPanel};
pub use patients::{NewPatient, Patient, PatientStore};
pub use reports::{
    render, MoveDirection, NewSection, RenderedReport, ReportContext, ReportTemplate,
    ReportTemplateStore, SectionKind, TemplateSection,
};
pub use results::{
    classify, count_results, Badge, Classification, MeasuredValue, ReferenceRange,
    ResultCounts, ResultEntrySession, ResultSet, ResultStatus, ResultValue, ReviewDecision,
    TestParameter,
};
pub use roles::{is_permitted, views_for, Role, View};
pub use samples::{elapsed_label, NewSample, Priority, Sample, SamplePatch, SampleStatus, SampleStore};
pub use store::LabStore;
pub use summary::LabSummary;
pub use workflow::TransitionPolicy;

pub use lims_types::{NonEmptyText, Price, TextError};
pub use lims_wire::SampleKind;
