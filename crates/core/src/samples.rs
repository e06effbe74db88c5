//! Sample store.
//!
//! Samples are kept in intake order. Ids double as barcodes and come from a
//! [`TimestampIdGenerator`], so they encode the intake time and never repeat within a
//! session.
//!
//! [`SampleStore::update`] is a raw field merge: it refreshes `updated_at` but does not
//! check the lifecycle. Use [`SampleStore::transition`] for checked status moves.

use crate::catalog::CatalogStore;
use crate::results::ResultValue;
use crate::workflow::{apply_transition, TransitionPolicy};
use crate::{LabError, LabResult};
use chrono::{DateTime, Utc};
use lims_ids::TimestampIdGenerator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleStatus {
    #[default]
    Received,
    Processing,
    Completed,
    Archived,
}

impl SampleStatus {
    pub const ALL: [SampleStatus; 4] = [
        SampleStatus::Received,
        SampleStatus::Processing,
        SampleStatus::Completed,
        SampleStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleStatus::Received => "received",
            SampleStatus::Processing => "processing",
            SampleStatus::Completed => "completed",
            SampleStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleStatus {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LabError::InvalidInput(format!("unknown sample status: {s}")))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
    Urgent,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        })
    }
}

/// A patient specimen submitted for one catalog test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub barcode: String,
    pub patient_id: String,
    pub patient_name: String,
    pub test_definition_ref: String,
    pub status: SampleStatus,
    pub priority: Priority,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Option<Vec<ResultValue>>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Intake data: a sample without its generated id, barcode and timestamps.
#[derive(Clone, Debug, Deserialize)]
pub struct NewSample {
    pub patient_id: String,
    pub patient_name: String,
    pub test_definition_ref: String,
    #[serde(default)]
    pub status: SampleStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Field-wise merge for [`SampleStore::update`]; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplePatch {
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub test_definition_ref: Option<String>,
    pub status: Option<SampleStatus>,
    pub priority: Option<Priority>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Option<Vec<ResultValue>>,
    pub notes: Option<String>,
}

impl SamplePatch {
    fn apply(self, sample: &mut Sample) {
        if let Some(v) = self.patient_id {
            sample.patient_id = v;
        }
        if let Some(v) = self.patient_name {
            sample.patient_name = v;
        }
        if let Some(v) = self.test_definition_ref {
            sample.test_definition_ref = v;
        }
        if let Some(v) = self.status {
            sample.status = v;
        }
        if let Some(v) = self.priority {
            sample.priority = v;
        }
        if let Some(v) = self.processed_at {
            sample.processed_at = Some(v);
        }
        if let Some(v) = self.completed_at {
            sample.completed_at = Some(v);
        }
        if let Some(v) = self.results {
            sample.results = Some(v);
        }
        if let Some(v) = self.notes {
            sample.notes = Some(v);
        }
    }
}

#[derive(Clone, Debug)]
pub struct SampleStore {
    samples: Vec<Sample>,
    ids: TimestampIdGenerator,
}

impl SampleStore {
    /// # Errors
    ///
    /// Returns [`LabError::Id`] if `id_prefix` is not a valid id prefix.
    pub fn new(id_prefix: &str) -> LabResult<Self> {
        Ok(Self {
            samples: Vec::new(),
            ids: TimestampIdGenerator::new(id_prefix)?,
        })
    }

    pub fn list(&self) -> &[Sample] {
        &self.samples
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Sample> {
        self.samples.iter().find(|s| s.id == id)
    }

    pub fn add(&mut self, new: NewSample) -> Sample {
        self.add_at(new, Utc::now())
    }

    /// Register a sample received at `now`.
    pub fn add_at(&mut self, new: NewSample, now: DateTime<Utc>) -> Sample {
        let mut id = self.ids.next_id_at(now);
        // Eight timestamp digits wrap roughly daily; skip anything already issued.
        while self.get_by_id(&id).is_some() {
            id = self.ids.next_id_at(now);
        }

        let sample = Sample {
            barcode: id.clone(),
            id,
            patient_id: new.patient_id,
            patient_name: new.patient_name,
            test_definition_ref: new.test_definition_ref,
            status: new.status,
            priority: new.priority,
            received_at: now,
            processed_at: None,
            completed_at: None,
            results: None,
            notes: new.notes,
            updated_at: now,
        };
        tracing::info!(sample_id = %sample.id, test = %sample.test_definition_ref, "sample received");
        self.samples.push(sample.clone());
        sample
    }

    /// Merge `patch` into the sample and refresh `updated_at`.
    ///
    /// Returns `None` (and changes nothing) if no sample has this id.
    pub fn update(&mut self, id: &str, patch: SamplePatch) -> Option<Sample> {
        self.update_at(id, patch, Utc::now())
    }

    pub fn update_at(&mut self, id: &str, patch: SamplePatch, now: DateTime<Utc>) -> Option<Sample> {
        let sample = self.samples.iter_mut().find(|s| s.id == id)?;
        patch.apply(sample);
        sample.updated_at = now;
        Some(sample.clone())
    }

    /// Move a sample through the lifecycle under `policy`.
    pub fn transition(
        &mut self,
        id: &str,
        to: SampleStatus,
        policy: TransitionPolicy,
    ) -> LabResult<Sample> {
        self.transition_at(id, to, policy, Utc::now())
    }

    pub fn transition_at(
        &mut self,
        id: &str,
        to: SampleStatus,
        policy: TransitionPolicy,
        now: DateTime<Utc>,
    ) -> LabResult<Sample> {
        let sample = self
            .samples
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| LabError::SampleNotFound(id.to_owned()))?;
        apply_transition(sample, to, policy, now)?;
        Ok(sample.clone())
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Sample> {
        self.samples.iter_mut().find(|s| s.id == id)
    }

    /// Number of samples referencing catalog test `test_id`.
    pub fn count_referencing(&self, test_id: &str) -> usize {
        self.samples
            .iter()
            .filter(|s| s.test_definition_ref == test_id)
            .count()
    }

    /// Case-insensitive search over sample id, patient name and test name.
    ///
    /// An empty `term` matches everything; `status` narrows to one lifecycle state.
    pub fn search<'a>(
        &'a self,
        catalog: &CatalogStore,
        term: &str,
        status: Option<SampleStatus>,
    ) -> Vec<&'a Sample> {
        let needle = term.trim().to_lowercase();
        self.samples
            .iter()
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .filter(|s| {
                if needle.is_empty() {
                    return true;
                }
                let test_name = catalog
                    .get(&s.test_definition_ref)
                    .map(|t| t.name.as_str().to_lowercase())
                    .unwrap_or_default();
                s.id.to_lowercase().contains(&needle)
                    || s.patient_name.to_lowercase().contains(&needle)
                    || test_name.contains(&needle)
            })
            .collect()
    }
}

/// Human-readable time since intake, e.g. `"2h 5m ago"` or `"12m ago"`.
pub fn elapsed_label(received_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - received_at).num_minutes().max(0);
    let (hours, minutes) = (elapsed / 60, elapsed % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m ago")
    } else {
        format!("{minutes}m ago")
    }
}
