//! Roles and the views each role may open.
//!
//! Dispatch is a static table; adding a view for a role means adding it to the row.

use crate::LabError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    LabTechnician,
    Doctor,
    Patient,
    Researcher,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::LabTechnician,
        Role::Doctor,
        Role::Patient,
        Role::Researcher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::LabTechnician => "lab-technician",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
            Role::Researcher => "researcher",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::LabTechnician => "Lab Technician",
            Role::Doctor => "Doctor",
            Role::Patient => "Patient",
            Role::Researcher => "Researcher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LabError::UnknownRole(s.to_owned()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Dashboard,
    SampleIntake,
    TestCatalog,
    SampleTracking,
    ResultEntry,
    Inventory,
    Equipment,
    RequestTest,
    ReviewResults,
    CriticalAlerts,
    BookAppointment,
    ViewReports,
    NewStudy,
    StudyData,
    Notifications,
    Settings,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::SampleIntake => "sample-intake",
            View::TestCatalog => "test-catalog",
            View::SampleTracking => "sample-tracking",
            View::ResultEntry => "result-entry",
            View::Inventory => "inventory",
            View::Equipment => "equipment",
            View::RequestTest => "request-test",
            View::ReviewResults => "review-results",
            View::CriticalAlerts => "critical-alerts",
            View::BookAppointment => "book-appointment",
            View::ViewReports => "view-reports",
            View::NewStudy => "new-study",
            View::StudyData => "study-data",
            View::Notifications => "notifications",
            View::Settings => "settings",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const LAB_TECHNICIAN_VIEWS: &[View] = &[
    View::Dashboard,
    View::SampleIntake,
    View::TestCatalog,
    View::SampleTracking,
    View::ResultEntry,
    View::Inventory,
    View::Equipment,
    View::Notifications,
    View::Settings,
];

const DOCTOR_VIEWS: &[View] = &[
    View::Dashboard,
    View::RequestTest,
    View::ReviewResults,
    View::CriticalAlerts,
    View::TestCatalog,
    View::Notifications,
    View::Settings,
];

const PATIENT_VIEWS: &[View] = &[
    View::Dashboard,
    View::BookAppointment,
    View::ViewReports,
    View::Notifications,
    View::Settings,
];

const RESEARCHER_VIEWS: &[View] = &[
    View::Dashboard,
    View::NewStudy,
    View::StudyData,
    View::Notifications,
    View::Settings,
];

const VIEW_TABLE: [(Role, &[View]); 4] = [
    (Role::LabTechnician, LAB_TECHNICIAN_VIEWS),
    (Role::Doctor, DOCTOR_VIEWS),
    (Role::Patient, PATIENT_VIEWS),
    (Role::Researcher, RESEARCHER_VIEWS),
];

/// Views available to `role`, in menu order. The first entry is the landing view.
pub fn views_for(role: Role) -> &'static [View] {
    VIEW_TABLE
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, views)| *views)
        .unwrap_or(&[])
}

pub fn is_permitted(role: Role, view: View) -> bool {
    views_for(role).contains(&view)
}
