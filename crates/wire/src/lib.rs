//! YAML wire/boundary support for laboratory seed data.
//!
//! This crate provides **wire models** and **translation helpers** for the files an
//! operator can hand to the service at start-up:
//! - a test catalog (`catalog.yaml`)
//! - parameter panels with reference ranges (`panels.yaml`)
//!
//! Parsing is strict: unknown keys are rejected and schema errors name the failing
//! field path. The domain-level carriers returned here are plain data; the core crate
//! converts them into its own store types.

pub mod catalog;
pub mod panels;

use std::path::Path;

// Re-export facades
pub use catalog::CatalogFile;
pub use panels::PanelFile;

// Re-export public domain-level types
pub use catalog::{CatalogEntryData, SampleKind};
pub use panels::{PanelData, ParameterData, RangeData};

/// Errors returned by the `lims-wire` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;

/// Deserialize `yaml_text` into `T`, reporting the path of the first mismatching field.
pub(crate) fn parse_strict<T>(yaml_text: &str, what: &str) -> WireResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
    serde_path_to_error::deserialize::<_, T>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>".to_owned()
        } else {
            path
        };
        WireError::Translation(format!("{what} schema mismatch at {path}: {source}"))
    })
}

pub(crate) fn read_file(path: &Path) -> WireResult<String> {
    Ok(std::fs::read_to_string(path)?)
}
