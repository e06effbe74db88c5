//! Report templates.
//!
//! A template is an ordered list of text sections. Section content may contain
//! `{PLACEHOLDER}` fields (upper-case letters, digits and `_`), which [`render`] fills
//! from a sample, its patient and its result set. Unknown placeholders are left in the
//! text as written and reported back to the caller.

use crate::catalog::TestDefinition;
use crate::constants::{REPORT_TEMPLATE_ID_PREFIX, SEQUENTIAL_ID_WIDTH};
use crate::patients::Patient;
use crate::results::{ResultSet, TestParameter};
use crate::samples::Sample;
use crate::{LabError, LabResult};
use chrono::{DateTime, Utc};
use lims_ids::SequentialIdGenerator;
use lims_types::NonEmptyText;
use serde::{Deserialize, Serialize};

const MISSING: &str = "N/A";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Header,
    Parameters,
    Interpretation,
    Recommendations,
    Footer,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemplateSection {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub title: String,
    pub content: String,
    /// 1-based position; kept in step with the section list.
    pub order: usize,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSection {
    #[serde(rename = "type")]
    pub kind: SectionKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportTemplate {
    pub id: String,
    pub name: NonEmptyText,
    pub category: String,
    sections: Vec<TemplateSection>,
    #[serde(skip)]
    section_ids: SequentialIdGenerator,
}

impl ReportTemplate {
    fn new(id: String, name: NonEmptyText, category: String) -> Self {
        Self {
            id,
            name,
            category,
            sections: Vec::new(),
            section_ids: SequentialIdGenerator::new("S", 1),
        }
    }

    pub fn sections(&self) -> &[TemplateSection] {
        &self.sections
    }

    /// Appends a section. A missing title defaults to `New <type>`.
    pub fn add_section(&mut self, new: NewSection) -> TemplateSection {
        let title = new
            .title
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("New {}", kind_label(new.kind)));
        let section = TemplateSection {
            id: self.section_ids.next_id(),
            kind: new.kind,
            title,
            content: new.content,
            order: self.sections.len() + 1,
        };
        self.sections.push(section.clone());
        section
    }

    pub fn remove_section(&mut self, section_id: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.id != section_id);
        let removed = self.sections.len() != before;
        if removed {
            self.renumber();
        }
        removed
    }

    /// Swaps a section with its neighbour. Moving past either end is a no-op.
    ///
    /// Returns `false` if the section is unknown or already at that end.
    pub fn move_section(&mut self, section_id: &str, direction: MoveDirection) -> bool {
        let Some(index) = self.sections.iter().position(|s| s.id == section_id) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1).filter(|&t| t < self.sections.len()),
        };
        let Some(target) = target else {
            return false;
        };
        self.sections.swap(index, target);
        self.renumber();
        true
    }

    fn renumber(&mut self) {
        for (i, section) in self.sections.iter_mut().enumerate() {
            section.order = i + 1;
        }
    }
}

fn kind_label(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::Header => "header",
        SectionKind::Parameters => "parameters",
        SectionKind::Interpretation => "interpretation",
        SectionKind::Recommendations => "recommendations",
        SectionKind::Footer => "footer",
    }
}

#[derive(Clone, Debug)]
pub struct ReportTemplateStore {
    templates: Vec<ReportTemplate>,
    ids: SequentialIdGenerator,
}

impl Default for ReportTemplateStore {
    fn default() -> Self {
        Self {
            templates: Vec::new(),
            ids: SequentialIdGenerator::new(REPORT_TEMPLATE_ID_PREFIX, SEQUENTIAL_ID_WIDTH),
        }
    }
}

impl ReportTemplateStore {
    /// A store holding the standard report (`RT001`).
    pub fn with_defaults() -> Self {
        let mut store = Self::default();
        let Ok(name) = NonEmptyText::new("Standard Report") else {
            return store;
        };
        let id = store.add(name, "General".into());
        if let Ok(template) = store.get_mut(&id) {
            for (kind, title, content) in [
                (
                    SectionKind::Header,
                    "Lab Information",
                    "Laboratory Name: {LAB_NAME}\nDate: {DATE}\nTime: {TIME}",
                ),
                (
                    SectionKind::Header,
                    "Patient",
                    "Patient: {PATIENT_NAME} ({PATIENT_ID})\nSample: {SAMPLE_ID}\nCollected: {COLLECTION_DATE} {COLLECTION_TIME}",
                ),
                (SectionKind::Parameters, "Test Results", "{TEST_NAME}\n{TEST_PARAMETERS}"),
                (SectionKind::Interpretation, "Interpretation", "{INTERPRETATION}"),
                (
                    SectionKind::Footer,
                    "Sign-off",
                    "Performed by: {TECHNICIAN}\nReviewed by: {DOCTOR_NAME}",
                ),
            ] {
                template.add_section(NewSection {
                    kind,
                    title: Some(title.to_owned()),
                    content: content.to_owned(),
                });
            }
        }
        store
    }

    pub fn list(&self) -> &[ReportTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&ReportTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Creates an empty template and returns its id.
    pub fn add(&mut self, name: NonEmptyText, category: String) -> String {
        let template = ReportTemplate::new(self.ids.next_id(), name, category);
        let id = template.id.clone();
        tracing::info!(template_id = %id, "report template added");
        self.templates.push(template);
        id
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != id);
        self.templates.len() != before
    }

    /// # Errors
    ///
    /// Returns [`LabError::TemplateNotFound`] if the id is unknown.
    pub fn get_mut(&mut self, id: &str) -> LabResult<&mut ReportTemplate> {
        self.templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LabError::TemplateNotFound(id.to_owned()))
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Everything a report may draw on.
pub struct ReportContext<'a> {
    pub lab_name: &'a str,
    pub sample: &'a Sample,
    pub patient: Option<&'a Patient>,
    pub test: Option<&'a TestDefinition>,
    pub parameters: &'a [TestParameter],
    pub results: Option<&'a ResultSet>,
    pub now: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedReport {
    pub template_id: String,
    pub sample_id: String,
    pub text: String,
    /// Placeholders left unfilled, in order of first appearance.
    pub unknown_placeholders: Vec<String>,
}

/// Renders `template` as plain text, one titled block per section in order.
pub fn render(template: &ReportTemplate, ctx: &ReportContext<'_>) -> RenderedReport {
    let mut unknown = Vec::new();
    let blocks: Vec<String> = template
        .sections
        .iter()
        .map(|section| {
            format!(
                "== {} ==\n{}",
                section.title,
                fill(&section.content, ctx, &mut unknown)
            )
        })
        .collect();

    RenderedReport {
        template_id: template.id.clone(),
        sample_id: ctx.sample.id.clone(),
        text: blocks.join("\n\n"),
        unknown_placeholders: unknown,
    }
}

fn fill(content: &str, ctx: &ReportContext<'_>, unknown: &mut Vec<String>) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let name = after
            .find('}')
            .map(|end| &after[..end])
            .filter(|name| is_placeholder_name(name));

        let Some(name) = name else {
            out.push('{');
            rest = after;
            continue;
        };
        match resolve(name, ctx) {
            Some(value) => out.push_str(&value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
                if !unknown.iter().any(|u| u == name) {
                    unknown.push(name.to_owned());
                }
            }
        }
        rest = &after[name.len() + 1..];
    }
    out.push_str(rest);
    out
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

fn or_missing<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_owned(), |v| v.to_string())
}

/// `None` means the placeholder is not known at all.
fn resolve(name: &str, ctx: &ReportContext<'_>) -> Option<String> {
    let sample = ctx.sample;
    let value = match name {
        "LAB_NAME" => ctx.lab_name.to_owned(),
        "DATE" | "REPORT_DATE" => ctx.now.format("%Y-%m-%d").to_string(),
        "TIME" => ctx.now.format("%H:%M").to_string(),
        "PATIENT_NAME" => sample.patient_name.clone(),
        "PATIENT_ID" => sample.patient_id.clone(),
        "PATIENT_AGE" => or_missing(ctx.patient.and_then(|p| p.age)),
        "PATIENT_GENDER" => or_missing(ctx.patient.and_then(|p| p.gender.as_deref())),
        "SAMPLE_ID" => sample.id.clone(),
        "COLLECTION_DATE" => sample.received_at.format("%Y-%m-%d").to_string(),
        "COLLECTION_TIME" => sample.received_at.format("%H:%M").to_string(),
        "SAMPLE_TYPE" => or_missing(ctx.test.map(|t| t.sample_kind.as_str())),
        "TEST_NAME" => or_missing(ctx.test.map(|t| t.name.as_str())),
        "TEST_PARAMETERS" => parameter_lines(ctx),
        "INTERPRETATION" => or_missing(ctx.results.and_then(|r| r.interpretation.as_deref())),
        "TECHNICIAN" => or_missing(ctx.results.map(|r| r.technician.as_str())),
        "DOCTOR_NAME" => or_missing(ctx.results.and_then(|r| r.reviewed_by.as_ref())),
        "RESULT_STATUS" => or_missing(ctx.results.map(|r| r.status)),
        _ => return None,
    };
    Some(value)
}

fn parameter_lines(ctx: &ReportContext<'_>) -> String {
    let Some(results) = ctx.results.filter(|r| !r.values.is_empty()) else {
        return "No results recorded".to_owned();
    };
    results
        .values
        .iter()
        .map(|value| {
            match ctx.parameters.iter().find(|p| p.id == value.parameter_id) {
                Some(p) => format!(
                    "{} ({}): {} {} [normal {}-{}] {}",
                    p.name,
                    p.id,
                    value.value,
                    p.unit,
                    p.normal_range.min,
                    p.normal_range.max,
                    value.badge()
                ),
                None => format!("{}: {} {}", value.parameter_id, value.value, value.badge()),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::PanelRegistry;
    use crate::results::ResultEntrySession;
    use crate::samples::{Priority, SampleStatus};
    use chrono::TimeZone;

    fn section(kind: SectionKind, title: &str) -> NewSection {
        NewSection {
            kind,
            title: Some(title.to_owned()),
            content: String::new(),
        }
    }

    fn titles(template: &ReportTemplate) -> Vec<(&str, usize)> {
        template
            .sections()
            .iter()
            .map(|s| (s.title.as_str(), s.order))
            .collect()
    }

    fn sample() -> Sample {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        Sample {
            id: "SAM12345678".into(),
            barcode: "SAM12345678".into(),
            patient_id: "P001".into(),
            patient_name: "Jane Smith".into(),
            test_definition_ref: "T001".into(),
            status: SampleStatus::Completed,
            priority: Priority::Normal,
            received_at: at,
            processed_at: None,
            completed_at: None,
            results: None,
            notes: None,
            updated_at: at,
        }
    }

    #[test]
    fn sections_keep_order_through_moves_and_removals() {
        let mut store = ReportTemplateStore::default();
        let id = store.add(NonEmptyText::new("Lipid").unwrap(), "Chemistry".into());
        let template = store.get_mut(&id).unwrap();

        let header = template.add_section(section(SectionKind::Header, "Header"));
        let params = template.add_section(section(SectionKind::Parameters, "Results"));
        let footer = template.add_section(section(SectionKind::Footer, "Footer"));
        assert_eq!(titles(template), [("Header", 1), ("Results", 2), ("Footer", 3)]);

        assert!(template.move_section(&footer.id, MoveDirection::Up));
        assert_eq!(titles(template), [("Header", 1), ("Footer", 2), ("Results", 3)]);

        assert!(!template.move_section(&header.id, MoveDirection::Up));
        assert!(!template.move_section(&params.id, MoveDirection::Down));
        assert!(!template.move_section("S99", MoveDirection::Down));

        assert!(template.remove_section(&header.id));
        assert!(!template.remove_section(&header.id));
        assert_eq!(titles(template), [("Footer", 1), ("Results", 2)]);

        let added = template.add_section(NewSection {
            kind: SectionKind::Recommendations,
            title: None,
            content: String::new(),
        });
        assert_eq!(added.title, "New recommendations");
        assert_eq!(added.order, 3);
        assert_ne!(added.id, header.id);
    }

    #[test]
    fn unknown_template_is_not_found() {
        let mut store = ReportTemplateStore::with_defaults();
        assert_eq!(store.list().len(), 1);
        assert!(matches!(
            store.get_mut("RT404"),
            Err(LabError::TemplateNotFound(id)) if id == "RT404"
        ));
        assert!(store.remove("RT001"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn renders_placeholders_from_sample_and_results() {
        let panel = PanelRegistry::with_defaults().get("T001").unwrap().clone();
        let sample = sample();
        let mut session = ResultEntrySession::new(&sample.id, "T001", panel.parameters.clone());
        session.enter("WBC", "25000");
        session.interpret("Marked leukocytosis");
        let set = ResultSet::from_session(
            &session,
            NonEmptyText::new("A. Technician").unwrap(),
            crate::results::ResultStatus::PendingReview,
            sample.received_at,
        );

        let mut store = ReportTemplateStore::default();
        let id = store.add(NonEmptyText::new("Custom").unwrap(), String::new());
        let template = store.get_mut(&id).unwrap();
        template.add_section(NewSection {
            kind: SectionKind::Header,
            title: Some("Lab".into()),
            content: "{LAB_NAME} | {PATIENT_NAME} | {PATIENT_AGE} | {DATE}".into(),
        });
        template.add_section(NewSection {
            kind: SectionKind::Parameters,
            title: Some("Results".into()),
            content: "{TEST_PARAMETERS}\n{INTERPRETATION}".into(),
        });

        let ctx = ReportContext {
            lab_name: "Central Lab",
            sample: &sample,
            patient: None,
            test: None,
            parameters: &panel.parameters,
            results: Some(&set),
            now: Utc.with_ymd_and_hms(2024, 1, 16, 8, 0, 0).unwrap(),
        };
        let report = render(template, &ctx);
        assert_eq!(
            report.text,
            "== Lab ==\nCentral Lab | Jane Smith | N/A | 2024-01-16\n\n\
             == Results ==\nWhite Blood Cells (WBC): 25000 cells/uL [normal 4000-11000] Critical\n\
             Marked leukocytosis"
        );
        assert!(report.unknown_placeholders.is_empty());
    }

    #[test]
    fn unknown_placeholders_are_kept_and_reported() {
        let sample = sample();
        let mut store = ReportTemplateStore::default();
        let id = store.add(NonEmptyText::new("Allergy").unwrap(), String::new());
        let template = store.get_mut(&id).unwrap();
        template.add_section(NewSection {
            kind: SectionKind::Header,
            title: Some("Header".into()),
            content: "{SYMPTOMS}; {SAMPLE_ID}; {symptoms}; {SYMPTOMS}; {LAB_PHONE}; {".into(),
        });

        let ctx = ReportContext {
            lab_name: "Central Lab",
            sample: &sample,
            patient: None,
            test: None,
            parameters: &[],
            results: None,
            now: sample.received_at,
        };
        let report = render(template, &ctx);
        assert_eq!(
            report.text,
            "== Header ==\n{SYMPTOMS}; SAM12345678; {symptoms}; {SYMPTOMS}; {LAB_PHONE}; {"
        );
        assert_eq!(report.unknown_placeholders, ["SYMPTOMS", "LAB_PHONE"]);
    }

    #[test]
    fn parameters_without_results_say_so() {
        let sample = sample();
        let ctx = ReportContext {
            lab_name: "Central Lab",
            sample: &sample,
            patient: None,
            test: None,
            parameters: &[],
            results: None,
            now: sample.received_at,
        };
        let template = ReportTemplateStore::with_defaults();
        let report = render(&template.list()[0], &ctx);
        assert!(report.text.contains("No results recorded"));
        assert!(report.text.contains("Reviewed by: N/A"));
        assert!(report.unknown_placeholders.is_empty());
    }
}
