//! The laboratory repository.
//!
//! [`LabStore`] owns every in-memory store of a running laboratory and carries the
//! operations that span more than one of them:
//!
//! - sample intake, which must reference an existing, active catalog test
//! - checked test deletion, which refuses tests still referenced by samples
//! - status transitions under the configured [`TransitionPolicy`]
//! - result entry, saving drafts, submitting for review and reviewing
//!
//! ## Result workflow
//!
//! ```text
//! start_result_entry -> save_draft*  -> submit -> review
//!                       (processing)   (completed) (approved | rejected)
//! ```
//!
//! Each sample has at most one result set. A rejected set may be re-entered and
//! resubmitted; a submitted or approved set is locked.
//!
//! There is no global instance: binaries construct one `LabStore` from a
//! [`CoreConfig`] and hand it to their callers.

use crate::catalog::{CatalogStore, NewTestDefinition, TestDefinition};
use crate::config::CoreConfig;
use crate::equipment::EquipmentStore;
use crate::inventory::InventoryStore;
use crate::panels::{ParameterPanel, PanelRegistry};
use crate::patients::{NewPatient, Patient, PatientStore};
use crate::reports::{render, RenderedReport, ReportContext, ReportTemplateStore};
use crate::results::{ResultEntrySession, ResultSet, ResultStatus, ReviewDecision};
use crate::samples::{NewSample, Sample, SamplePatch, SampleStatus, SampleStore};
use crate::summary::LabSummary;
use crate::workflow::TransitionPolicy;
use crate::{LabError, LabResult};
use chrono::{DateTime, Utc};
use lims_types::NonEmptyText;
use lims_wire::{CatalogFile, PanelFile};
use std::sync::Arc;

#[derive(Debug)]
pub struct LabStore {
    cfg: Arc<CoreConfig>,
    catalog: CatalogStore,
    samples: SampleStore,
    patients: PatientStore,
    panels: PanelRegistry,
    results: Vec<ResultSet>,
    inventory: InventoryStore,
    equipment: EquipmentStore,
    reports: ReportTemplateStore,
}

impl LabStore {
    /// Creates a store from resolved configuration.
    ///
    /// Without a catalog file the built-in catalog (T001-T003) is used. Panels from a
    /// panel file are added on top of the built-in complete blood count panel and
    /// replace it if they define one for the same test.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Wire`] if a configured seed file cannot be read or parsed,
    /// and [`LabError::Id`] if the sample id prefix is invalid.
    pub fn new(cfg: Arc<CoreConfig>) -> LabResult<Self> {
        let catalog = match cfg.catalog_file() {
            Some(path) => {
                let entries = CatalogFile::load(path)?;
                tracing::info!(path = %path.display(), tests = entries.len(), "catalog loaded");
                CatalogStore::from_entries(entries)
            }
            None => CatalogStore::with_defaults(),
        };

        let mut panels = PanelRegistry::with_defaults();
        if let Some(path) = cfg.panels_file() {
            let loaded = PanelFile::load(path)?;
            tracing::info!(path = %path.display(), panels = loaded.len(), "panels loaded");
            for panel in loaded {
                panels.insert(panel.into());
            }
        }

        Ok(Self {
            samples: SampleStore::new(cfg.sample_id_prefix())?,
            cfg,
            catalog,
            patients: PatientStore::default(),
            panels,
            results: Vec::new(),
            inventory: InventoryStore::default(),
            equipment: EquipmentStore::default(),
            reports: ReportTemplateStore::with_defaults(),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        self.cfg.transition_policy()
    }

    // ------------------------------------------------------------------------
    // Component stores
    // ------------------------------------------------------------------------

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Direct catalog access. Deleting through this handle skips the sample check
    /// done by [`LabStore::delete_test`].
    pub fn catalog_mut(&mut self) -> &mut CatalogStore {
        &mut self.catalog
    }

    pub fn samples(&self) -> &SampleStore {
        &self.samples
    }

    pub fn patients(&self) -> &PatientStore {
        &self.patients
    }

    pub fn panels(&self) -> &PanelRegistry {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> &mut PanelRegistry {
        &mut self.panels
    }

    pub fn inventory(&self) -> &InventoryStore {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut InventoryStore {
        &mut self.inventory
    }

    pub fn equipment(&self) -> &EquipmentStore {
        &self.equipment
    }

    pub fn equipment_mut(&mut self) -> &mut EquipmentStore {
        &mut self.equipment
    }

    pub fn reports(&self) -> &ReportTemplateStore {
        &self.reports
    }

    pub fn reports_mut(&mut self) -> &mut ReportTemplateStore {
        &mut self.reports
    }

    pub fn results(&self) -> &[ResultSet] {
        &self.results
    }

    pub fn result_for(&self, sample_id: &str) -> Option<&ResultSet> {
        self.results.iter().find(|r| r.sample_id == sample_id)
    }

    // ------------------------------------------------------------------------
    // Catalog and patients
    // ------------------------------------------------------------------------

    pub fn add_test(&mut self, new: NewTestDefinition) -> TestDefinition {
        self.catalog.add(new)
    }

    /// Removes a catalog test that no sample references.
    ///
    /// # Errors
    ///
    /// - [`LabError::TestInUse`] if any sample references the test
    /// - [`LabError::TestNotFound`] if the id is unknown
    pub fn delete_test(&mut self, test_id: &str) -> LabResult<()> {
        let samples = self.samples.count_referencing(test_id);
        if samples > 0 {
            tracing::warn!(test_id, samples, "refusing to delete referenced test");
            return Err(LabError::TestInUse {
                test_id: test_id.to_owned(),
                samples,
            });
        }
        if !self.catalog.delete(test_id) {
            return Err(LabError::TestNotFound(test_id.to_owned()));
        }
        Ok(())
    }

    pub fn register_patient(&mut self, new: NewPatient) -> Patient {
        self.patients.add(new)
    }

    // ------------------------------------------------------------------------
    // Samples
    // ------------------------------------------------------------------------

    /// Registers a received sample.
    ///
    /// A blank `patient_name` is filled in from the patient register when `patient_id`
    /// names a registered patient.
    ///
    /// # Errors
    ///
    /// - [`LabError::TestNotFound`] if the test is not in the catalog
    /// - [`LabError::InvalidInput`] if the test is inactive, or the patient id or name
    ///   is missing
    pub fn intake(&mut self, new: NewSample) -> LabResult<Sample> {
        self.intake_at(new, Utc::now())
    }

    pub fn intake_at(&mut self, mut new: NewSample, now: DateTime<Utc>) -> LabResult<Sample> {
        let test = self
            .catalog
            .get(&new.test_definition_ref)
            .ok_or_else(|| LabError::TestNotFound(new.test_definition_ref.clone()))?;
        if !test.is_active {
            return Err(LabError::InvalidInput(format!(
                "test {} is not currently offered",
                test.id
            )));
        }

        new.patient_id = new.patient_id.trim().to_owned();
        if new.patient_id.is_empty() {
            return Err(LabError::InvalidInput("patient id is required".into()));
        }
        if new.patient_name.trim().is_empty() {
            let registered = self
                .patients
                .get_by_id(&new.patient_id)
                .ok_or_else(|| LabError::InvalidInput("patient name is required".into()))?;
            new.patient_name = registered.name.as_str().to_owned();
        }

        Ok(self.samples.add_at(new, now))
    }

    /// Raw field merge; see [`SampleStore::update`].
    pub fn update_sample(&mut self, id: &str, patch: SamplePatch) -> Option<Sample> {
        self.samples.update(id, patch)
    }

    /// Moves a sample under the configured transition policy.
    pub fn transition(&mut self, sample_id: &str, to: SampleStatus) -> LabResult<Sample> {
        self.samples
            .transition(sample_id, to, self.cfg.transition_policy())
    }

    /// Case-insensitive search over sample id, patient name and test name.
    pub fn search(&self, term: &str, status: Option<SampleStatus>) -> Vec<&Sample> {
        self.samples.search(&self.catalog, term, status)
    }

    // ------------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------------

    /// Opens result entry for a sample, preloaded with any editable saved result set.
    ///
    /// # Errors
    ///
    /// - [`LabError::SampleNotFound`] if the sample is unknown
    /// - [`LabError::PanelNotFound`] if the sample's test has no parameter panel
    pub fn start_result_entry(&self, sample_id: &str) -> LabResult<ResultEntrySession> {
        let sample = self
            .samples
            .get_by_id(sample_id)
            .ok_or_else(|| LabError::SampleNotFound(sample_id.to_owned()))?;
        let panel = self.panel_for(&sample.test_definition_ref)?;

        let mut session =
            ResultEntrySession::new(&sample.id, &sample.test_definition_ref, panel.parameters.clone());
        if let Some(saved) = self.result_for(sample_id).filter(|r| r.is_editable()) {
            session.restore(saved);
        }
        Ok(session)
    }

    /// Stores the session as a draft. A `received` sample moves to `processing`.
    ///
    /// # Errors
    ///
    /// See [`LabStore::submit`]; an empty session is accepted as a draft.
    pub fn save_draft(
        &mut self,
        session: &ResultEntrySession,
        technician: NonEmptyText,
    ) -> LabResult<ResultSet> {
        self.record(session, technician, ResultStatus::Draft, Utc::now())
    }

    /// Submits the session for review.
    ///
    /// The values are written into the sample and the sample is completed, passing
    /// through `processing` if it was still `received`.
    ///
    /// # Errors
    ///
    /// - [`LabError::SampleNotFound`] if the session's sample is unknown
    /// - [`LabError::InvalidInput`] if the session is for a different test than the
    ///   sample, or (on submit) no value has been entered
    /// - [`LabError::ResultsLocked`] if the sample's results were already submitted or
    ///   approved
    pub fn submit(
        &mut self,
        session: &ResultEntrySession,
        technician: NonEmptyText,
    ) -> LabResult<ResultSet> {
        self.record(session, technician, ResultStatus::PendingReview, Utc::now())
    }

    /// Approves or rejects a submitted result set.
    ///
    /// # Errors
    ///
    /// - [`LabError::ResultNotFound`] if the sample has no result set
    /// - [`LabError::InvalidReviewState`] unless the set is pending review
    pub fn review(
        &mut self,
        sample_id: &str,
        reviewer: NonEmptyText,
        decision: ReviewDecision,
    ) -> LabResult<ResultSet> {
        let set = self
            .results
            .iter_mut()
            .find(|r| r.sample_id == sample_id)
            .ok_or_else(|| LabError::ResultNotFound(sample_id.to_owned()))?;
        set.review(reviewer, decision, Utc::now())?;
        tracing::info!(sample_id, status = %set.status, "results reviewed");
        Ok(set.clone())
    }

    // ------------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------------

    /// Renders a report for a sample, with whatever results it has so far.
    ///
    /// # Errors
    ///
    /// - [`LabError::TemplateNotFound`] if the template is unknown
    /// - [`LabError::SampleNotFound`] if the sample is unknown
    pub fn render_report(&self, template_id: &str, sample_id: &str) -> LabResult<RenderedReport> {
        self.render_report_at(template_id, sample_id, Utc::now())
    }

    pub fn render_report_at(
        &self,
        template_id: &str,
        sample_id: &str,
        now: DateTime<Utc>,
    ) -> LabResult<RenderedReport> {
        let template = self
            .reports
            .get(template_id)
            .ok_or_else(|| LabError::TemplateNotFound(template_id.to_owned()))?;
        let sample = self
            .samples
            .get_by_id(sample_id)
            .ok_or_else(|| LabError::SampleNotFound(sample_id.to_owned()))?;
        let ctx = ReportContext {
            lab_name: self.cfg.lab_name(),
            sample,
            patient: self.patients.get_by_id(&sample.patient_id),
            test: self.catalog.get(&sample.test_definition_ref),
            parameters: self
                .panels
                .get(&sample.test_definition_ref)
                .map(|p| p.parameters.as_slice())
                .unwrap_or_default(),
            results: self.result_for(sample_id),
            now,
        };

        let report = render(template, &ctx);
        if !report.unknown_placeholders.is_empty() {
            tracing::debug!(
                template_id,
                unknown = ?report.unknown_placeholders,
                "report has unfilled placeholders"
            );
        }
        Ok(report)
    }

    pub fn summary(&self) -> LabSummary {
        LabSummary::compute(self.samples.list(), &self.results)
    }

    fn panel_for(&self, test_id: &str) -> LabResult<&ParameterPanel> {
        self.panels
            .get(test_id)
            .ok_or_else(|| LabError::PanelNotFound(test_id.to_owned()))
    }

    fn record(
        &mut self,
        session: &ResultEntrySession,
        technician: NonEmptyText,
        status: ResultStatus,
        now: DateTime<Utc>,
    ) -> LabResult<ResultSet> {
        let sample_id = session.sample_id();
        let sample = self
            .samples
            .get_by_id(sample_id)
            .ok_or_else(|| LabError::SampleNotFound(sample_id.to_owned()))?;
        if sample.test_definition_ref != session.test_id() {
            return Err(LabError::InvalidInput(format!(
                "sample {} is for test {}, not {}",
                sample_id,
                sample.test_definition_ref,
                session.test_id()
            )));
        }
        if status == ResultStatus::PendingReview && session.values().is_empty() {
            return Err(LabError::InvalidInput(format!(
                "no result values entered for sample {sample_id}"
            )));
        }
        let existing = self.results.iter().position(|r| r.sample_id == sample_id);
        if let Some(set) = existing.map(|idx| &self.results[idx]) {
            if !set.is_editable() {
                return Err(LabError::ResultsLocked {
                    sample_id: sample_id.to_owned(),
                    status: set.status,
                });
            }
        }

        // Forward steps from received/processing are legal under every policy.
        let policy = self.cfg.transition_policy();
        let mut current = sample.status;
        if current == SampleStatus::Received {
            current = self
                .samples
                .transition_at(sample_id, SampleStatus::Processing, policy, now)?
                .status;
        }
        if status == ResultStatus::PendingReview {
            if current == SampleStatus::Processing {
                self.samples
                    .transition_at(sample_id, SampleStatus::Completed, policy, now)?;
            }
            if let Some(sample) = self.samples.get_mut(sample_id) {
                sample.results = Some(session.values().to_vec());
                sample.updated_at = now;
            }
        }

        let set = match existing {
            Some(idx) => {
                let set = &mut self.results[idx];
                set.replace_entry(session, technician, status, now);
                set.clone()
            }
            None => {
                let set = ResultSet::from_session(session, technician, status, now);
                self.results.push(set.clone());
                set
            }
        };
        tracing::info!(
            sample_id,
            status = %set.status,
            values = set.values.len(),
            critical = set.has_critical(),
            "results recorded"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::Priority;
    use std::io::Write;

    fn store() -> LabStore {
        LabStore::new(Arc::new(CoreConfig::default())).expect("default store")
    }

    fn permissive_store() -> LabStore {
        let cfg = CoreConfig::default().with_transition_policy(TransitionPolicy::Permissive);
        LabStore::new(Arc::new(cfg)).expect("permissive store")
    }

    fn intake(test: &str) -> NewSample {
        NewSample {
            patient_id: "P001".into(),
            patient_name: "Jane Smith".into(),
            test_definition_ref: test.into(),
            status: SampleStatus::Received,
            priority: Priority::Normal,
            notes: None,
        }
    }

    fn tech() -> NonEmptyText {
        NonEmptyText::new("A. Technician").unwrap()
    }

    fn doctor() -> NonEmptyText {
        NonEmptyText::new("Dr. Reviewer").unwrap()
    }

    #[test]
    fn intake_requires_known_active_test() {
        let mut lab = store();
        assert!(matches!(
            lab.intake(intake("T999")),
            Err(LabError::TestNotFound(id)) if id == "T999"
        ));

        lab.catalog_mut().toggle_active("T002");
        assert!(matches!(
            lab.intake(intake("T002")),
            Err(LabError::InvalidInput(_))
        ));
        assert!(lab.samples().list().is_empty());
    }

    #[test]
    fn intake_fills_name_from_patient_register() {
        let mut lab = store();
        let patient = lab.register_patient(NewPatient::named(NonEmptyText::new("Bob Johnson").unwrap()));
        let mut new = intake("T001");
        new.patient_id = patient.id.clone();
        new.patient_name = " ".into();
        let sample = lab.intake(new).expect("intake");
        assert_eq!(sample.patient_name, "Bob Johnson");

        let mut unknown = intake("T001");
        unknown.patient_id = "P404".into();
        unknown.patient_name = String::new();
        assert!(matches!(lab.intake(unknown), Err(LabError::InvalidInput(_))));
    }

    #[test]
    fn delete_test_refuses_referenced_tests() {
        let mut lab = store();
        lab.intake(intake("T001")).unwrap();

        let err = lab.delete_test("T001").expect_err("T001 in use");
        assert!(matches!(err, LabError::TestInUse { samples: 1, .. }));
        assert!(lab.catalog().get("T001").is_some());

        lab.delete_test("T003").expect("T003 unused");
        assert!(matches!(lab.delete_test("T003"), Err(LabError::TestNotFound(_))));
    }

    #[test]
    fn strict_policy_rejects_skipping_processing() {
        let mut lab = store();
        let s = lab.intake(intake("T001")).unwrap();
        assert!(matches!(
            lab.transition(&s.id, SampleStatus::Completed),
            Err(LabError::IllegalTransition { .. })
        ));
        let moved = lab.transition(&s.id, SampleStatus::Processing).unwrap();
        assert!(moved.processed_at.is_some());
    }

    #[test]
    fn permissive_policy_allows_override() {
        let mut lab = permissive_store();
        let s = lab.intake(intake("T001")).unwrap();
        let moved = lab.transition(&s.id, SampleStatus::Archived).unwrap();
        assert_eq!(moved.status, SampleStatus::Archived);
    }

    #[test]
    fn result_entry_requires_panel() {
        let mut lab = store();
        let s = lab.intake(intake("T002")).unwrap();
        assert!(matches!(
            lab.start_result_entry(&s.id),
            Err(LabError::PanelNotFound(t)) if t == "T002"
        ));
        assert!(matches!(
            lab.start_result_entry("SAM00000000"),
            Err(LabError::SampleNotFound(_))
        ));
    }

    #[test]
    fn save_draft_moves_sample_to_processing() {
        let mut lab = store();
        let s = lab.intake(intake("T001")).unwrap();
        let mut session = lab.start_result_entry(&s.id).unwrap();
        session.enter("WBC", "7000");

        let draft = lab.save_draft(&session, tech()).unwrap();
        assert_eq!(draft.status, ResultStatus::Draft);
        let sample = lab.samples().get_by_id(&s.id).unwrap();
        assert_eq!(sample.status, SampleStatus::Processing);
        assert!(sample.results.is_none());

        let resumed = lab.start_result_entry(&s.id).unwrap();
        assert_eq!(resumed.values(), session.values());
    }

    #[test]
    fn submit_completes_sample_and_copies_values() {
        let mut lab = store();
        let s = lab.intake(intake("T001")).unwrap();
        let mut session = lab.start_result_entry(&s.id).unwrap();
        session.enter("WBC", "25000");
        session.enter("HGB", "13.0");
        session.interpret("Marked leukocytosis, refer.");

        let set = lab.submit(&session, tech()).unwrap();
        assert_eq!(set.status, ResultStatus::PendingReview);
        assert!(set.has_critical());

        let sample = lab.samples().get_by_id(&s.id).unwrap();
        assert_eq!(sample.status, SampleStatus::Completed);
        assert!(sample.processed_at.is_some());
        assert!(sample.completed_at.is_some());
        assert_eq!(sample.results.as_deref(), Some(session.values()));
    }

    #[test]
    fn submit_requires_values() {
        let mut lab = store();
        let s = lab.intake(intake("T001")).unwrap();
        let session = lab.start_result_entry(&s.id).unwrap();
        assert!(matches!(
            lab.submit(&session, tech()),
            Err(LabError::InvalidInput(_))
        ));
        assert_eq!(lab.samples().get_by_id(&s.id).unwrap().status, SampleStatus::Received);
    }

    #[test]
    fn review_only_after_submit_and_locks_results() {
        let mut lab = store();
        let s = lab.intake(intake("T001")).unwrap();
        let mut session = lab.start_result_entry(&s.id).unwrap();
        session.enter("WBC", "7000");

        assert!(matches!(
            lab.review(&s.id, doctor(), ReviewDecision::Approve),
            Err(LabError::ResultNotFound(_))
        ));
        lab.save_draft(&session, tech()).unwrap();
        assert!(matches!(
            lab.review(&s.id, doctor(), ReviewDecision::Approve),
            Err(LabError::InvalidReviewState { status: ResultStatus::Draft, .. })
        ));

        let submitted = lab.submit(&session, tech()).unwrap();
        let approved = lab.review(&s.id, doctor(), ReviewDecision::Approve).unwrap();
        assert_eq!(approved.id, submitted.id);
        assert_eq!(approved.status, ResultStatus::Approved);

        assert!(matches!(
            lab.submit(&session, tech()),
            Err(LabError::ResultsLocked { status: ResultStatus::Approved, .. })
        ));
    }

    #[test]
    fn rejected_results_can_be_resubmitted() {
        let mut lab = store();
        let s = lab.intake(intake("T001")).unwrap();
        let mut session = lab.start_result_entry(&s.id).unwrap();
        session.enter("WBC", "7000");
        lab.submit(&session, tech()).unwrap();
        lab.review(&s.id, doctor(), ReviewDecision::Reject).unwrap();

        let mut again = lab.start_result_entry(&s.id).unwrap();
        again.enter("WBC", "7200");
        let resubmitted = lab.submit(&again, tech()).unwrap();
        assert_eq!(resubmitted.status, ResultStatus::PendingReview);
        assert!(resubmitted.reviewed_by.is_none());
        assert_eq!(lab.results().len(), 1);
    }

    #[test]
    fn summary_counts_statuses_and_results() {
        let mut lab = store();
        let a = lab.intake(intake("T001")).unwrap();
        let mut urgent = intake("T002");
        urgent.priority = Priority::Urgent;
        lab.intake(urgent).unwrap();
        let c = lab.intake(intake("T001")).unwrap();

        let mut session = lab.start_result_entry(&a.id).unwrap();
        session.enter("WBC", "25000");
        lab.submit(&session, tech()).unwrap();

        let mut draft = lab.start_result_entry(&c.id).unwrap();
        draft.enter("WBC", "7000");
        lab.save_draft(&draft, tech()).unwrap();

        assert_eq!(
            lab.summary(),
            LabSummary {
                pending: 1,
                in_progress: 1,
                completed: 1,
                archived: 0,
                urgent_open: 1,
                critical_results: 1,
                pending_review: 1,
            }
        );
    }

    #[test]
    fn search_uses_catalog_names() {
        let mut lab = store();
        lab.intake(intake("T003")).unwrap();
        assert_eq!(lab.search("urinalysis", None).len(), 1);
        assert!(lab.search("lipid", None).is_empty());
    }

    #[test]
    fn seeds_from_configured_files() {
        let mut catalog = tempfile::NamedTempFile::new().unwrap();
        write!(
            catalog,
            "tests:\n  - id: T020\n    name: Glucose\n    category: Chemistry\n    description: Fasting glucose\n    duration_minutes: 15\n    price: 600.0\n    requires_special_prep: true\n    sample_kind: blood\n"
        )
        .unwrap();
        let mut panels = tempfile::NamedTempFile::new().unwrap();
        write!(
            panels,
            "panels:\n  - test_id: T020\n    parameters:\n      - id: GLU\n        name: Glucose\n        unit: mg/dL\n        normal_range: {{ min: 70, max: 99 }}\n        critical_range: {{ min: 40, max: 400 }}\n"
        )
        .unwrap();

        let cfg = CoreConfig::new(
            "LAB".into(),
            TransitionPolicy::Strict,
            Some(catalog.path().to_path_buf()),
            Some(panels.path().to_path_buf()),
        )
        .unwrap();
        let mut lab = LabStore::new(Arc::new(cfg)).expect("seeded store");

        assert_eq!(lab.catalog().list().len(), 1);
        assert!(lab.panels().get("T001").is_some());
        assert!(lab.panels().get("T020").is_some());

        let s = lab.intake(intake("T020")).unwrap();
        assert!(s.id.starts_with("LAB"));
        let mut session = lab.start_result_entry(&s.id).unwrap();
        assert_eq!(session.enter("GLU", "450").map(|v| v.is_critical), Some(true));
    }

    #[test]
    fn bad_seed_file_is_reported() {
        let mut catalog = tempfile::NamedTempFile::new().unwrap();
        writeln!(catalog, "tests: nope").unwrap();
        let cfg = CoreConfig::new(
            "SAM".into(),
            TransitionPolicy::Strict,
            Some(catalog.path().to_path_buf()),
            None,
        )
        .unwrap();
        assert!(matches!(
            LabStore::new(Arc::new(cfg)),
            Err(LabError::Wire(_))
        ));
    }

    #[test]
    fn renders_standard_report_for_reviewed_sample() {
        let cfg = CoreConfig::default().with_lab_name(Some("Central Lab".into()));
        let mut lab = LabStore::new(Arc::new(cfg)).unwrap();
        let patient = lab.register_patient(NewPatient::named(NonEmptyText::new("Jane Smith").unwrap()));
        let mut new = intake("T001");
        new.patient_id = patient.id;
        let s = lab.intake(new).unwrap();

        let mut session = lab.start_result_entry(&s.id).unwrap();
        session.enter("HGB", "6.5");
        session.interpret("Severe anaemia");
        lab.submit(&session, tech()).unwrap();
        lab.review(&s.id, doctor(), ReviewDecision::Approve).unwrap();

        let report = lab.render_report("RT001", &s.id).unwrap();
        assert_eq!(report.sample_id, s.id);
        assert!(report.text.starts_with("== Lab Information ==\nLaboratory Name: Central Lab"));
        assert!(report.text.contains("Complete Blood Count\nHemoglobin (HGB): 6.5 g/dL [normal 12-15.5] Critical"));
        assert!(report.text.contains("Severe anaemia"));
        assert!(report.text.contains("Reviewed by: Dr. Reviewer"));
        assert!(report.unknown_placeholders.is_empty());
    }

    #[test]
    fn render_report_rejects_unknown_template_or_sample() {
        let mut lab = store();
        let s = lab.intake(intake("T001")).unwrap();
        assert!(matches!(
            lab.render_report("RT404", &s.id),
            Err(LabError::TemplateNotFound(_))
        ));
        assert!(matches!(
            lab.render_report("RT001", "SAM00000000"),
            Err(LabError::SampleNotFound(_))
        ));
    }
}
