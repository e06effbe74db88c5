//! Patient register.

use crate::constants::{PATIENT_ID_PREFIX, SEQUENTIAL_ID_WIDTH};
use chrono::{DateTime, Utc};
use lims_ids::SequentialIdGenerator;
use lims_types::NonEmptyText;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: NonEmptyText,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registration data for a new patient. Only the name is required.
#[derive(Clone, Debug, Deserialize)]
pub struct NewPatient {
    pub name: NonEmptyText,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewPatient {
    pub fn named(name: NonEmptyText) -> Self {
        Self {
            name,
            phone: None,
            email: None,
            age: None,
            gender: None,
            address: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PatientStore {
    patients: Vec<Patient>,
    ids: SequentialIdGenerator,
}

impl Default for PatientStore {
    fn default() -> Self {
        Self {
            patients: Vec::new(),
            ids: SequentialIdGenerator::new(PATIENT_ID_PREFIX, SEQUENTIAL_ID_WIDTH),
        }
    }
}

impl PatientStore {
    pub fn list(&self) -> &[Patient] {
        &self.patients
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn add(&mut self, new: NewPatient) -> Patient {
        let patient = Patient {
            id: self.ids.next_id(),
            name: new.name,
            phone: blank_to_none(new.phone),
            email: blank_to_none(new.email),
            age: new.age,
            gender: blank_to_none(new.gender),
            address: blank_to_none(new.address),
            created_at: Utc::now(),
        };
        tracing::info!(patient_id = %patient.id, "patient registered");
        self.patients.push(patient.clone());
        patient
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
