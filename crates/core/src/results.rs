//! Result classification, result entry and result sets.
//!
//! A measured value is classified against the parameter's reference ranges:
//!
//! - abnormal: the value lies outside the normal range
//! - critical: a critical range is defined and the value lies outside it
//!
//! Bounds are inclusive, so a value equal to `min` or `max` is inside the range. The
//! display badge gives `Critical` precedence over `Abnormal`.

use crate::{LabError, LabResult};
use chrono::{DateTime, Utc};
use lims_ids::RecordUuid;
use lims_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive numeric bounds `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
}

impl ReferenceRange {
    /// # Errors
    ///
    /// Returns [`LabError::InvalidInput`] if a bound is not finite or `min > max`.
    pub fn new(min: f64, max: f64) -> LabResult<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(LabError::InvalidInput(format!(
                "reference range must be finite with min <= max (got {min} - {max})"
            )));
        }
        Ok(Self { min, max })
    }

    /// True when `value` falls below `min` or above `max`.
    pub fn excludes(&self, value: f64) -> bool {
        value < self.min || value > self.max
    }
}

impl From<lims_wire::RangeData> for ReferenceRange {
    fn from(range: lims_wire::RangeData) -> Self {
        Self {
            min: range.min,
            max: range.max,
        }
    }
}

/// A measurable parameter of a test (e.g. WBC in a complete blood count).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestParameter {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub normal_range: ReferenceRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_range: Option<ReferenceRange>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_abnormal: bool,
    pub is_critical: bool,
}

impl Classification {
    pub fn badge(&self) -> Badge {
        if self.is_critical {
            Badge::Critical
        } else if self.is_abnormal {
            Badge::Abnormal
        } else {
            Badge::Normal
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Normal,
    Abnormal,
    Critical,
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Badge::Normal => "Normal",
            Badge::Abnormal => "Abnormal",
            Badge::Critical => "Critical",
        })
    }
}

/// Classify `value` against `parameter`'s ranges.
pub fn classify(value: f64, parameter: &TestParameter) -> Classification {
    Classification {
        is_abnormal: parameter.normal_range.excludes(value),
        is_critical: parameter
            .critical_range
            .map(|critical| critical.excludes(value))
            .unwrap_or(false),
    }
}

/// A recorded measurement. Qualitative results are kept as text and never flagged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasuredValue {
    Numeric(f64),
    Text(String),
}

impl fmt::Display for MeasuredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasuredValue::Numeric(v) => write!(f, "{v}"),
            MeasuredValue::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultValue {
    pub parameter_id: String,
    pub value: MeasuredValue,
    pub is_abnormal: bool,
    pub is_critical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ResultValue {
    /// Builds a classified numeric value for `parameter`.
    pub fn numeric(parameter: &TestParameter, value: f64) -> Self {
        let c = classify(value, parameter);
        Self {
            parameter_id: parameter.id.clone(),
            value: MeasuredValue::Numeric(value),
            is_abnormal: c.is_abnormal,
            is_critical: c.is_critical,
            comment: None,
        }
    }

    pub fn badge(&self) -> Badge {
        Classification {
            is_abnormal: self.is_abnormal,
            is_critical: self.is_critical,
        }
        .badge()
    }
}

/// Counts shown on the result-entry summary cards.
///
/// `abnormal` excludes critical values, so the three counts partition the entered values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResultCounts {
    pub critical: usize,
    pub abnormal: usize,
    pub normal: usize,
}

pub fn count_results(values: &[ResultValue]) -> ResultCounts {
    values
        .iter()
        .fold(ResultCounts::default(), |mut counts, v| {
            match v.badge() {
                Badge::Critical => counts.critical += 1,
                Badge::Abnormal => counts.abnormal += 1,
                Badge::Normal => counts.normal += 1,
            }
            counts
        })
}

// ============================================================================
// Result entry
// ============================================================================

/// In-progress result entry for one sample.
///
/// Values are keyed by parameter id; entering a parameter again replaces its value in
/// place. Input that does not name a panel parameter, or does not parse as a finite
/// number, is ignored and leaves any earlier value untouched.
#[derive(Clone, Debug)]
pub struct ResultEntrySession {
    sample_id: String,
    test_id: String,
    parameters: Vec<TestParameter>,
    values: Vec<ResultValue>,
    interpretation: Option<String>,
}

impl ResultEntrySession {
    pub fn new(
        sample_id: impl Into<String>,
        test_id: impl Into<String>,
        parameters: Vec<TestParameter>,
    ) -> Self {
        Self {
            sample_id: sample_id.into(),
            test_id: test_id.into(),
            parameters,
            values: Vec::new(),
            interpretation: None,
        }
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn parameters(&self) -> &[TestParameter] {
        &self.parameters
    }

    pub fn values(&self) -> &[ResultValue] {
        &self.values
    }

    pub fn interpretation(&self) -> Option<&str> {
        self.interpretation.as_deref()
    }

    /// Parse `raw` and record it for `parameter_id`.
    ///
    /// Returns the recorded value, or `None` if the input was ignored.
    pub fn enter(&mut self, parameter_id: &str, raw: &str) -> Option<&ResultValue> {
        match raw.trim().parse::<f64>() {
            Ok(value) => self.enter_value(parameter_id, value),
            Err(_) => {
                tracing::debug!(
                    sample_id = %self.sample_id,
                    parameter_id,
                    "ignoring unparseable result input"
                );
                None
            }
        }
    }

    /// Record an already-parsed value. Non-finite values are ignored.
    pub fn enter_value(&mut self, parameter_id: &str, value: f64) -> Option<&ResultValue> {
        if !value.is_finite() {
            tracing::debug!(sample_id = %self.sample_id, parameter_id, "ignoring non-finite value");
            return None;
        }
        let Some(parameter) = self.parameters.iter().find(|p| p.id == parameter_id) else {
            tracing::debug!(sample_id = %self.sample_id, parameter_id, "ignoring unknown parameter");
            return None;
        };

        let mut entry = ResultValue::numeric(parameter, value);
        let idx = match self.values.iter().position(|v| v.parameter_id == parameter_id) {
            Some(idx) => {
                entry.comment = self.values[idx].comment.take();
                self.values[idx] = entry;
                idx
            }
            None => {
                self.values.push(entry);
                self.values.len() - 1
            }
        };
        self.values.get(idx)
    }

    /// Attach a comment to an entered value. Returns false if the parameter has no value.
    pub fn comment(&mut self, parameter_id: &str, text: &str) -> bool {
        let text = text.trim();
        match self.values.iter_mut().find(|v| v.parameter_id == parameter_id) {
            Some(v) => {
                v.comment = (!text.is_empty()).then(|| text.to_owned());
                true
            }
            None => false,
        }
    }

    pub fn interpret(&mut self, text: &str) {
        let text = text.trim();
        self.interpretation = (!text.is_empty()).then(|| text.to_owned());
    }

    pub fn badge(&self, parameter_id: &str) -> Option<Badge> {
        self.values
            .iter()
            .find(|v| v.parameter_id == parameter_id)
            .map(ResultValue::badge)
    }

    pub fn counts(&self) -> ResultCounts {
        count_results(&self.values)
    }

    /// Reload the values and interpretation of a previously saved result set.
    pub(crate) fn restore(&mut self, set: &ResultSet) {
        self.values = set.values.clone();
        self.interpretation = set.interpretation.clone();
    }

    /// True once every panel parameter has a value.
    pub fn is_complete(&self) -> bool {
        self.parameters
            .iter()
            .all(|p| self.values.iter().any(|v| v.parameter_id == p.id))
    }
}

// ============================================================================
// Result sets
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Draft,
    PendingReview,
    Approved,
    Rejected,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResultStatus::Draft => "draft",
            ResultStatus::PendingReview => "pending_review",
            ResultStatus::Approved => "approved",
            ResultStatus::Rejected => "rejected",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// The stored outcome of result entry for one sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub id: RecordUuid,
    pub sample_id: String,
    pub test_definition_ref: String,
    pub values: Vec<ResultValue>,
    pub interpretation: Option<String>,
    pub technician: NonEmptyText,
    pub status: ResultStatus,
    pub reviewed_by: Option<NonEmptyText>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResultSet {
    pub(crate) fn from_session(
        session: &ResultEntrySession,
        technician: NonEmptyText,
        status: ResultStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordUuid::new(),
            sample_id: session.sample_id.clone(),
            test_definition_ref: session.test_id.clone(),
            values: session.values.clone(),
            interpretation: session.interpretation.clone(),
            technician,
            status,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the entered data, keeping id and creation time.
    pub(crate) fn replace_entry(
        &mut self,
        session: &ResultEntrySession,
        technician: NonEmptyText,
        status: ResultStatus,
        now: DateTime<Utc>,
    ) {
        self.values = session.values.clone();
        self.interpretation = session.interpretation.clone();
        self.technician = technician;
        self.status = status;
        self.reviewed_by = None;
        self.reviewed_at = None;
        self.updated_at = now;
    }

    pub fn counts(&self) -> ResultCounts {
        count_results(&self.values)
    }

    /// Drafts and rejected sets can be re-entered; submitted and approved ones cannot.
    pub fn is_editable(&self) -> bool {
        matches!(self.status, ResultStatus::Draft | ResultStatus::Rejected)
    }

    pub fn has_critical(&self) -> bool {
        self.values.iter().any(|v| v.is_critical)
    }

    pub(crate) fn review(
        &mut self,
        reviewer: NonEmptyText,
        decision: ReviewDecision,
        now: DateTime<Utc>,
    ) -> LabResult<()> {
        if self.status != ResultStatus::PendingReview {
            return Err(LabError::InvalidReviewState {
                sample_id: self.sample_id.clone(),
                status: self.status,
            });
        }
        self.status = match decision {
            ReviewDecision::Approve => ResultStatus::Approved,
            ReviewDecision::Reject => ResultStatus::Rejected,
        };
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wbc() -> TestParameter {
        TestParameter {
            id: "WBC".into(),
            name: "White Blood Cells".into(),
            unit: "cells/uL".into(),
            normal_range: ReferenceRange::new(4000.0, 11000.0).unwrap(),
            critical_range: Some(ReferenceRange::new(2000.0, 20000.0).unwrap()),
        }
    }

    fn hgb_without_critical() -> TestParameter {
        TestParameter {
            id: "HGB".into(),
            name: "Hemoglobin".into(),
            unit: "g/dL".into(),
            normal_range: ReferenceRange::new(12.0, 15.5).unwrap(),
            critical_range: None,
        }
    }

    #[test]
    fn wbc_above_normal_is_abnormal() {
        let c = classify(12000.0, &wbc());
        assert!(c.is_abnormal);
        assert!(!c.is_critical);
        assert_eq!(c.badge(), Badge::Abnormal);
        assert_eq!(c.badge().to_string(), "Abnormal");
    }

    #[test]
    fn wbc_above_critical_is_critical() {
        let c = classify(25000.0, &wbc());
        assert!(c.is_critical);
        assert_eq!(c.badge(), Badge::Critical);
    }

    #[test]
    fn wbc_in_range_is_normal() {
        let c = classify(7000.0, &wbc());
        assert!(!c.is_abnormal);
        assert!(!c.is_critical);
        assert_eq!(c.badge(), Badge::Normal);
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(classify(4000.0, &wbc()).badge(), Badge::Normal);
        assert_eq!(classify(11000.0, &wbc()).badge(), Badge::Normal);
        assert_eq!(classify(20000.0, &wbc()).badge(), Badge::Abnormal);
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        assert!(ReferenceRange::new(10.0, 1.0).is_err());
        assert!(ReferenceRange::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn session_ignores_unparseable_input() {
        let mut session = ResultEntrySession::new("SAM1", "T001", vec![wbc()]);
        assert!(session.enter("WBC", "abc").is_none());
        assert!(session.enter("WBC", "").is_none());
        assert!(session.enter("WBC", "NaN").is_none());
        assert!(session.enter("WBC", "inf").is_none());
        assert!(session.values().is_empty());
    }

    #[test]
    fn session_ignores_unknown_parameter() {
        let mut session = ResultEntrySession::new("SAM1", "T001", vec![wbc()]);
        assert!(session.enter("PLT", "250000").is_none());
        assert!(session.values().is_empty());
    }

    #[test]
    fn unparseable_input_keeps_previous_value() {
        let mut session = ResultEntrySession::new("SAM1", "T001", vec![wbc()]);
        session.enter("WBC", "7000");
        session.enter("WBC", "7k");
        assert_eq!(session.values().len(), 1);
        assert_eq!(session.values()[0].value, MeasuredValue::Numeric(7000.0));
    }

    #[test]
    fn reentry_replaces_value_and_keeps_comment() {
        let mut session = ResultEntrySession::new("SAM1", "T001", vec![wbc(), hgb_without_critical()]);
        session.enter("WBC", "7000");
        assert!(session.comment("WBC", "haemolysed, repeat"));
        session.enter("HGB", "13.1");
        let v = session.enter("WBC", " 25000 ").expect("recorded").clone();

        assert_eq!(session.values().len(), 2);
        assert_eq!(session.values()[0].parameter_id, "WBC");
        assert!(v.is_critical);
        assert_eq!(v.comment.as_deref(), Some("haemolysed, repeat"));
        assert_eq!(session.badge("WBC"), Some(Badge::Critical));
    }

    #[test]
    fn comment_requires_entered_value() {
        let mut session = ResultEntrySession::new("SAM1", "T001", vec![wbc()]);
        assert!(!session.comment("WBC", "no value yet"));
    }

    #[test]
    fn counts_partition_values() {
        let mut session = ResultEntrySession::new("SAM1", "T001", vec![wbc(), hgb_without_critical()]);
        session.enter("WBC", "25000");
        session.enter("HGB", "9.0");
        assert_eq!(
            session.counts(),
            ResultCounts {
                critical: 1,
                abnormal: 1,
                normal: 0
            }
        );
        assert!(session.is_complete());
    }

    #[test]
    fn review_only_from_pending() {
        let mut session = ResultEntrySession::new("SAM1", "T001", vec![wbc()]);
        session.enter("WBC", "7000");
        let tech = NonEmptyText::new("A. Tech").unwrap();
        let mut set = ResultSet::from_session(&session, tech, ResultStatus::Draft, Utc::now());

        let err = set
            .review(NonEmptyText::new("Dr. Rev").unwrap(), ReviewDecision::Approve, Utc::now())
            .expect_err("draft cannot be reviewed");
        assert!(matches!(
            err,
            LabError::InvalidReviewState {
                status: ResultStatus::Draft,
                ..
            }
        ));

        set.status = ResultStatus::PendingReview;
        set.review(NonEmptyText::new("Dr. Rev").unwrap(), ReviewDecision::Reject, Utc::now())
            .expect("pending can be reviewed");
        assert_eq!(set.status, ResultStatus::Rejected);
        assert_eq!(set.reviewed_by.as_ref().map(|r| r.as_str()), Some("Dr. Rev"));
    }

    #[test]
    fn text_values_serialize_untagged() {
        let v = ResultValue {
            parameter_id: "COLOR".into(),
            value: MeasuredValue::Text("amber".into()),
            is_abnormal: false,
            is_critical: false,
            comment: None,
        };
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"value\":\"amber\""), "{json}");
    }

    fn range_strategy() -> impl Strategy<Value = ReferenceRange> {
        (-1.0e6f64..1.0e6, 0.0f64..1.0e6).prop_map(|(min, width)| ReferenceRange {
            min,
            max: min + width,
        })
    }

    proptest! {
        #[test]
        fn abnormal_iff_outside_normal(value in -2.0e6f64..2.0e6, normal in range_strategy()) {
            let p = TestParameter {
                id: "X".into(),
                name: "X".into(),
                unit: String::new(),
                normal_range: normal,
                critical_range: None,
            };
            let c = classify(value, &p);
            prop_assert_eq!(c.is_abnormal, value < normal.min || value > normal.max);
            prop_assert!(!c.is_critical);
        }

        #[test]
        fn critical_iff_outside_critical(
            value in -2.0e6f64..2.0e6,
            normal in range_strategy(),
            critical in range_strategy(),
        ) {
            let p = TestParameter {
                id: "X".into(),
                name: "X".into(),
                unit: String::new(),
                normal_range: normal,
                critical_range: Some(critical),
            };
            let c = classify(value, &p);
            prop_assert_eq!(c.is_critical, value < critical.min || value > critical.max);
            prop_assert_eq!(c.badge() == Badge::Critical, c.is_critical);
        }
    }
}
