use crate::results::ResultStatus;
use crate::samples::SampleStatus;

#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid text: {0}")]
    Text(#[from] lims_types::TextError),
    #[error("invalid identifier: {0}")]
    Id(#[from] lims_ids::IdError),
    #[error("seed file error: {0}")]
    Wire(#[from] lims_wire::WireError),

    #[error("test definition not found: {0}")]
    TestNotFound(String),
    #[error("sample not found: {0}")]
    SampleNotFound(String),
    #[error("patient not found: {0}")]
    PatientNotFound(String),
    #[error("inventory item not found: {0}")]
    InventoryItemNotFound(String),
    #[error("equipment not found: {0}")]
    EquipmentNotFound(String),
    #[error("no parameter panel defined for test {0}")]
    PanelNotFound(String),
    #[error("no result set recorded for sample {0}")]
    ResultNotFound(String),
    #[error("report template not found: {0}")]
    TemplateNotFound(String),
    #[error("report section {section_id} not found in template {template_id}")]
    SectionNotFound {
        template_id: String,
        section_id: String,
    },

    #[error("test {test_id} is referenced by {samples} sample(s)")]
    TestInUse { test_id: String, samples: usize },
    #[error("sample {sample_id} cannot move from {from} to {to}")]
    IllegalTransition {
        sample_id: String,
        from: SampleStatus,
        to: SampleStatus,
    },
    #[error("result set for sample {sample_id} is {status}, not pending review")]
    InvalidReviewState {
        sample_id: String,
        status: ResultStatus,
    },
    #[error("result set for sample {sample_id} is {status} and can no longer be edited")]
    ResultsLocked {
        sample_id: String,
        status: ResultStatus,
    },

    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown transition policy: {0}")]
    UnknownTransitionPolicy(String),
}

pub type LabResult<T> = std::result::Result<T, LabError>;
