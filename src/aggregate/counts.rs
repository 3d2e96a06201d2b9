//! Count tables: measurements per subject, per group, replicates per day.

use crate::data::{Day, Measurement};
use crate::error::{Result, TimecourseError};
use std::collections::{BTreeMap, BTreeSet};

/// Number of measurements per subject.
pub fn measurements_per_subject(measurements: &[Measurement]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for m in measurements {
        *counts.entry(m.subject_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// Number of measurements per treatment group.
pub fn measurements_per_group(measurements: &[Measurement]) -> Result<BTreeMap<String, usize>> {
    let mut counts = BTreeMap::new();
    for (idx, m) in measurements.iter().enumerate() {
        *counts.entry(require_group(m, idx)?.to_string()).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Number of distinct subjects per treatment group.
pub fn subjects_per_group(measurements: &[Measurement]) -> Result<BTreeMap<String, usize>> {
    let mut subjects: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for (idx, m) in measurements.iter().enumerate() {
        subjects
            .entry(require_group(m, idx)?.to_string())
            .or_default()
            .insert(&m.subject_id);
    }
    Ok(subjects.into_iter().map(|(g, s)| (g, s.len())).collect())
}

/// Number of replicate measurements per (group, day).
pub fn replicates_per_group_day(
    measurements: &[Measurement],
) -> Result<BTreeMap<(String, Day), usize>> {
    let mut counts = BTreeMap::new();
    for (idx, m) in measurements.iter().enumerate() {
        let group = require_group(m, idx)?.to_string();
        *counts.entry((group, m.day)).or_insert(0) += 1;
    }
    Ok(counts)
}

fn require_group(m: &Measurement, idx: usize) -> Result<&str> {
    m.group.as_deref().ok_or_else(|| TimecourseError::Schema {
        source_name: "measurements".to_string(),
        reason: format!(
            "row {} (subject '{}') has no treatment group",
            idx + 1,
            m.subject_id
        ),
    })
}
