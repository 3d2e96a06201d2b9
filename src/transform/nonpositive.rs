//! Explicit removal of rows the log transform cannot handle.

use crate::data::Measurement;
use tracing::{info, warn};

/// What [`drop_nonpositive`] removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DropReport {
    /// Rows kept.
    pub kept: usize,
    /// `(subject, day, value)` of every dropped row, in input order.
    pub dropped: Vec<(String, f64, f64)>,
}

impl DropReport {
    /// Number of dropped rows.
    pub fn n_dropped(&self) -> usize {
        self.dropped.len()
    }
}

/// Remove measurements with `value <= 0` (or NaN) and report them.
///
/// This is the only place rows are excluded before a log transform, and
/// every exclusion is logged.
pub fn drop_nonpositive(measurements: &[Measurement]) -> (Vec<Measurement>, DropReport) {
    let mut kept = Vec::with_capacity(measurements.len());
    let mut dropped = Vec::new();

    for m in measurements {
        if m.value > 0.0 {
            kept.push(m.clone());
        } else {
            warn!(
                "Dropping non-positive value {} (subject '{}', day {})",
                m.value, m.subject_id, m.day
            );
            dropped.push((m.subject_id.clone(), m.day.value(), m.value));
        }
    }

    if !dropped.is_empty() {
        info!(
            "Dropped {} of {} measurements with non-positive values",
            dropped.len(),
            measurements.len()
        );
    }

    let report = DropReport {
        kept: kept.len(),
        dropped,
    };
    (kept, report)
}
