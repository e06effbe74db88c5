//! Sample lifecycle rules.
//!
//! The lifecycle is linear:
//!
//! ```text
//! received -> processing -> completed -> archived
//! ```
//!
//! Moving a sample to the status it already has is a no-op. Every other move is checked
//! against the configured [`TransitionPolicy`]: `Strict` accepts only the next step,
//! `Permissive` accepts any target so staff can correct a mis-scanned sample, and logs the
//! out-of-order move.
//!
//! Raw field updates through [`crate::SampleStore::update`] bypass these rules entirely.

use crate::samples::{Sample, SampleStatus};
use crate::{LabError, LabResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Only `received -> processing -> completed -> archived`.
    #[default]
    Strict,
    /// Any status may be set at any time.
    Permissive,
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransitionPolicy::Strict => "strict",
            TransitionPolicy::Permissive => "permissive",
        })
    }
}

impl FromStr for TransitionPolicy {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(TransitionPolicy::Strict),
            "permissive" => Ok(TransitionPolicy::Permissive),
            _ => Err(LabError::UnknownTransitionPolicy(s.to_owned())),
        }
    }
}

impl SampleStatus {
    /// The status that follows this one in the lifecycle, if any.
    pub fn next(&self) -> Option<SampleStatus> {
        match self {
            SampleStatus::Received => Some(SampleStatus::Processing),
            SampleStatus::Processing => Some(SampleStatus::Completed),
            SampleStatus::Completed => Some(SampleStatus::Archived),
            SampleStatus::Archived => None,
        }
    }

    /// True for a self-transition or a single forward step.
    pub fn can_transition_to(&self, to: SampleStatus) -> bool {
        *self == to || self.next() == Some(to)
    }
}

/// Move `sample` to `to`, stamping lifecycle timestamps.
///
/// Returns `Ok(false)` when the sample already had status `to` (nothing is touched).
pub(crate) fn apply_transition(
    sample: &mut Sample,
    to: SampleStatus,
    policy: TransitionPolicy,
    now: DateTime<Utc>,
) -> LabResult<bool> {
    let from = sample.status;
    if from == to {
        return Ok(false);
    }

    if !from.can_transition_to(to) {
        match policy {
            TransitionPolicy::Strict => {
                tracing::warn!(sample_id = %sample.id, %from, %to, "rejected status transition");
                return Err(LabError::IllegalTransition {
                    sample_id: sample.id.clone(),
                    from,
                    to,
                });
            }
            TransitionPolicy::Permissive => {
                tracing::warn!(sample_id = %sample.id, %from, %to, "out-of-order status override");
            }
        }
    }

    sample.status = to;
    match to {
        SampleStatus::Processing if sample.processed_at.is_none() => {
            sample.processed_at = Some(now);
        }
        SampleStatus::Completed if sample.completed_at.is_none() => {
            sample.completed_at = Some(now);
        }
        _ => {}
    }
    sample.updated_at = now;

    tracing::info!(sample_id = %sample.id, %from, %to, "sample status changed");
    Ok(true)
}
