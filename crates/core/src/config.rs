//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup (binaries read the environment) and
//! then handed to [`crate::LabStore`]. Nothing in this crate reads environment variables
//! itself, which keeps tests independent of the process environment.

use crate::constants::{DEFAULT_LAB_NAME, DEFAULT_SAMPLE_ID_PREFIX};
use crate::workflow::TransitionPolicy;
use crate::{LabError, LabResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    sample_id_prefix: String,
    transition_policy: TransitionPolicy,
    catalog_file: Option<PathBuf>,
    panels_file: Option<PathBuf>,
    lab_name: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            sample_id_prefix: DEFAULT_SAMPLE_ID_PREFIX.to_owned(),
            transition_policy: TransitionPolicy::default(),
            catalog_file: None,
            panels_file: None,
            lab_name: DEFAULT_LAB_NAME.to_owned(),
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::InvalidInput`] if the sample id prefix is empty or contains
    /// anything other than ASCII uppercase letters.
    pub fn new(
        sample_id_prefix: String,
        transition_policy: TransitionPolicy,
        catalog_file: Option<PathBuf>,
        panels_file: Option<PathBuf>,
    ) -> LabResult<Self> {
        let prefix = sample_id_prefix.trim();
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(LabError::InvalidInput(format!(
                "sample id prefix must be ASCII uppercase letters, got '{}'",
                sample_id_prefix
            )));
        }

        Ok(Self {
            sample_id_prefix: prefix.to_owned(),
            transition_policy,
            catalog_file,
            panels_file,
            lab_name: DEFAULT_LAB_NAME.to_owned(),
        })
    }

    pub fn sample_id_prefix(&self) -> &str {
        &self.sample_id_prefix
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        self.transition_policy
    }

    pub fn catalog_file(&self) -> Option<&Path> {
        self.catalog_file.as_deref()
    }

    pub fn panels_file(&self) -> Option<&Path> {
        self.panels_file.as_deref()
    }

    pub fn lab_name(&self) -> &str {
        &self.lab_name
    }

    pub fn with_transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.transition_policy = policy;
        self
    }

    /// Blank names keep the current one.
    pub fn with_lab_name(mut self, name: Option<String>) -> Self {
        if let Some(name) = name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()) {
            self.lab_name = name;
        }
        self
    }
}

/// Parse the transition policy from an optional environment value.
///
/// `None` or blank input yields the default ([`TransitionPolicy::Strict`]).
pub fn transition_policy_from_env_value(value: Option<String>) -> LabResult<TransitionPolicy> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<TransitionPolicy>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Resolve an optional seed-file path from an environment value.
///
/// Blank input means "no seed file". A non-blank value must point at an existing file.
pub fn seed_file_from_env_value(value: Option<String>) -> LabResult<Option<PathBuf>> {
    let Some(raw) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let path = PathBuf::from(raw);
    if !path.is_file() {
        return Err(LabError::InvalidInput(format!(
            "seed file does not exist: {}",
            path.display()
        )));
    }
    Ok(Some(path))
}
