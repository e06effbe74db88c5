//! Dashboard counters.

use crate::results::{ResultSet, ResultStatus};
use crate::samples::{Priority, Sample, SampleStatus};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LabSummary {
    /// Samples in `received`.
    pub pending: usize,
    /// Samples in `processing`.
    pub in_progress: usize,
    pub completed: usize,
    pub archived: usize,
    /// Urgent samples not yet completed.
    pub urgent_open: usize,
    /// Result sets containing at least one critical value.
    pub critical_results: usize,
    pub pending_review: usize,
}

impl LabSummary {
    pub fn compute<'a>(
        samples: impl IntoIterator<Item = &'a Sample>,
        results: impl IntoIterator<Item = &'a ResultSet>,
    ) -> Self {
        let mut summary = Self::default();
        for sample in samples {
            match sample.status {
                SampleStatus::Received => summary.pending += 1,
                SampleStatus::Processing => summary.in_progress += 1,
                SampleStatus::Completed => summary.completed += 1,
                SampleStatus::Archived => summary.archived += 1,
            }
            let open = matches!(
                sample.status,
                SampleStatus::Received | SampleStatus::Processing
            );
            if open && sample.priority == Priority::Urgent {
                summary.urgent_open += 1;
            }
        }
        for set in results {
            if set.has_critical() {
                summary.critical_results += 1;
            }
            if set.status == ResultStatus::PendingReview {
                summary.pending_review += 1;
            }
        }
        summary
    }
}
