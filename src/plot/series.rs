//! Line series, facets and group-by-day pivot tables.

use crate::aggregate::{GroupKey, GroupSummary};
use crate::data::{Day, Measurement, ValueField};
use crate::error::{Result, TimecourseError};
use crate::plot::markers::post_treatment_days_by_group;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One connected line: a subject over time, or a group mean over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Series label (subject id or group name).
    pub label: String,
    /// Treatment group of the series, if known.
    pub group: Option<String>,
    /// `(day, y)` points sorted by day.
    pub points: Vec<(f64, f64)>,
}

/// All subject trajectories of one treatment group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub group: String,
    pub trajectories: Vec<Trajectory>,
    pub post_treatment_days: Vec<f64>,
}

/// One trajectory per subject, sorted by subject id, points sorted by day.
///
/// # Errors
/// `Schema` if `field` is not available on every measurement.
pub fn trajectories(measurements: &[Measurement], field: ValueField) -> Result<Vec<Trajectory>> {
    let mut by_subject: BTreeMap<&str, (Option<String>, Vec<(Day, f64)>)> = BTreeMap::new();
    for m in measurements {
        let y = require_field(m, field)?;
        let entry = by_subject
            .entry(m.subject_id.as_str())
            .or_insert_with(|| (m.group.clone(), Vec::new()));
        entry.1.push((m.day, y));
    }

    Ok(by_subject
        .into_iter()
        .map(|(subject, (group, mut points))| {
            points.sort_by(|a, b| a.0.cmp(&b.0));
            Trajectory {
                label: subject.to_string(),
                group,
                points: points.into_iter().map(|(d, y)| (d.value(), y)).collect(),
            }
        })
        .collect())
}

/// Subject trajectories split by treatment group, with each group's
/// post-treatment days. Facets are sorted by group name.
///
/// # Errors
/// `Schema` if a measurement has no group or lacks `field`.
pub fn facets(measurements: &[Measurement], field: ValueField) -> Result<Vec<Facet>> {
    if let Some(m) = measurements.iter().find(|m| m.group.is_none()) {
        return Err(TimecourseError::Schema {
            source_name: "measurements".to_string(),
            reason: format!("subject '{}' has no treatment group to facet by", m.subject_id),
        });
    }

    let markers = post_treatment_days_by_group(measurements);
    let series = trajectories(measurements, field)?;

    Ok(markers
        .into_iter()
        .map(|(group, days)| Facet {
            trajectories: series
                .iter()
                .filter(|t| t.group.as_deref() == Some(group.as_str()))
                .cloned()
                .collect(),
            post_treatment_days: days.into_iter().map(Day::value).collect(),
            group,
        })
        .collect())
}

/// Mean-over-time lines, one per group, from group+day summaries.
///
/// Summaries keyed by day alone produce a single line labelled `all` with no
/// group; it sorts before the group lines.
pub fn mean_trajectories(summaries: &[GroupSummary]) -> Vec<Trajectory> {
    let mut lines: BTreeMap<Option<&str>, Vec<(Day, f64)>> = BTreeMap::new();
    for s in summaries {
        lines.entry(s.key.group()).or_default().push((s.key.day(), s.mean));
    }
    lines
        .into_iter()
        .map(|(group, mut points)| {
            points.sort_by(|a, b| a.0.cmp(&b.0));
            Trajectory {
                label: group.unwrap_or("all").to_string(),
                group: group.map(str::to_string),
                points: points.into_iter().map(|(d, y)| (d.value(), y)).collect(),
            }
        })
        .collect()
}

/// Median-over-time lines, shaped like [`mean_trajectories`].
pub fn median_trajectories(summaries: &[GroupSummary]) -> Vec<Trajectory> {
    let as_means: Vec<GroupSummary> = summaries
        .iter()
        .map(|s| GroupSummary {
            mean: s.median,
            ..s.clone()
        })
        .collect();
    mean_trajectories(&as_means)
}

/// Groups x days matrix of summary means, for heatmaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    /// Row labels, sorted.
    pub groups: Vec<String>,
    /// Column labels, ascending.
    pub days: Vec<f64>,
    /// Means; NaN where a group has no measurement on a day.
    pub values: DMatrix<f64>,
}

impl PivotTable {
    /// Cell for `(group, day)`.
    pub fn get(&self, group: &str, day: impl Into<Day>) -> Option<f64> {
        let day = day.into();
        let row = self.groups.iter().position(|g| g == group)?;
        let col = self.days.iter().position(|&d| Day(d) == day)?;
        Some(self.values[(row, col)])
    }

    /// Smallest and largest defined cell, for a colour scale.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Pivot group+day summaries into a groups x days matrix of means.
///
/// # Errors
/// `Schema` if a summary is keyed by day alone.
pub fn group_mean_pivot(summaries: &[GroupSummary]) -> Result<PivotTable> {
    let mut groups = BTreeSet::new();
    let mut days = BTreeSet::new();
    for s in summaries {
        match &s.key {
            GroupKey::GroupDay(group, day) => {
                groups.insert(group.clone());
                days.insert(*day);
            }
            GroupKey::Day(_) => {
                return Err(TimecourseError::Schema {
                    source_name: "summaries".to_string(),
                    reason: "pivot needs group+day summaries".to_string(),
                })
            }
        }
    }

    let groups: Vec<String> = groups.into_iter().collect();
    let days: Vec<Day> = days.into_iter().collect();
    let mut values = DMatrix::from_element(groups.len(), days.len(), f64::NAN);

    for s in summaries {
        if let GroupKey::GroupDay(group, day) = &s.key {
            // Both lookups succeed: the label sets were built from these keys.
            if let (Some(row), Some(col)) = (
                groups.iter().position(|g| g == group),
                days.iter().position(|d| d == day),
            ) {
                values[(row, col)] = s.mean;
            }
        }
    }

    Ok(PivotTable {
        groups,
        days: days.into_iter().map(Day::value).collect(),
        values,
    })
}

fn require_field(m: &Measurement, field: ValueField) -> Result<f64> {
    m.field(field).ok_or_else(|| TimecourseError::Schema {
        source_name: "measurements".to_string(),
        reason: format!("subject '{}' has no {} value", m.subject_id, field.name()),
    })
}
