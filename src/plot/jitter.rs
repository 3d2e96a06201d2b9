//! Seeded horizontal jitter for scatter plots of replicates.
//!
//! Several subjects are usually measured on the same day, so their points
//! overlap. Each point gets a small x offset drawn uniformly from
//! `[-range, +range)`. Offsets are display-only: stored days never change.

use crate::aggregate::{GroupBy, GroupKey};
use crate::data::{Measurement, ValueField};
use crate::error::{Result, TimecourseError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Jitter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JitterConfig {
    /// Half-width of the offset interval.
    pub range: f64,
    /// Seed for the generator.
    pub seed: u64,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            range: 0.4,
            seed: 42,
        }
    }
}

/// One x offset per measurement, indexed like the input sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JitterOffsets {
    range: f64,
    offsets: Vec<f64>,
}

impl JitterOffsets {
    /// Offset for the record at `index`.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.offsets.get(index).copied()
    }

    /// Offsets in record order.
    pub fn as_slice(&self) -> &[f64] {
        &self.offsets
    }

    /// Half-width the offsets were drawn with.
    pub fn range(&self) -> f64 {
        self.range
    }

    /// Number of offsets.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// A measurement placed on a scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub subject_id: String,
    pub group: Option<String>,
    /// The stored day, unchanged.
    pub day: f64,
    /// Display x: `day + offset`.
    pub x: f64,
    pub y: f64,
}

/// Draw jitter offsets with a caller-supplied generator.
///
/// Each offset lies in the half-open interval `[-range, range)`: the lower
/// bound can be drawn, the upper bound never is.
///
/// Groups are visited in ascending key order and, within a group, members
/// receive offsets in input order. The same generator state, grouping and
/// input order therefore always reproduce the same offsets.
///
/// # Errors
/// - `Domain` if `range` is not finite and strictly positive
/// - `Schema` if `by` needs a group a measurement lacks
pub fn jitter<R: Rng + ?Sized>(
    measurements: &[Measurement],
    by: GroupBy,
    range: f64,
    rng: &mut R,
) -> Result<JitterOffsets> {
    if !range.is_finite() || range <= 0.0 {
        return Err(TimecourseError::Domain(format!(
            "jitter range must be finite and positive, got {}",
            range
        )));
    }

    let mut members: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for (idx, m) in measurements.iter().enumerate() {
        let key = GroupKey::of(m, by).ok_or_else(|| TimecourseError::Schema {
            source_name: "measurements".to_string(),
            reason: format!(
                "row {} (subject '{}') has no treatment group to jitter within",
                idx + 1,
                m.subject_id
            ),
        })?;
        members.entry(key).or_default().push(idx);
    }

    let mut offsets = vec![0.0; measurements.len()];
    for indices in members.values() {
        for &idx in indices {
            offsets[idx] = rng.gen_range(-range..range);
        }
    }

    Ok(JitterOffsets { range, offsets })
}

/// Draw jitter offsets from a `StdRng` seeded with `config.seed`.
pub fn jitter_seeded(
    measurements: &[Measurement],
    by: GroupBy,
    config: &JitterConfig,
) -> Result<JitterOffsets> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    jitter(measurements, by, config.range, &mut rng)
}

/// Pair each measurement with its jittered x position.
///
/// # Errors
/// `InvalidParameter` if the offsets were drawn for a different number of
/// rows, `Schema` if the requested field is missing.
pub fn scatter_points(
    measurements: &[Measurement],
    offsets: &JitterOffsets,
    field: ValueField,
) -> Result<Vec<ScatterPoint>> {
    if offsets.len() != measurements.len() {
        return Err(TimecourseError::InvalidParameter(format!(
            "{} jitter offsets for {} measurements",
            offsets.len(),
            measurements.len()
        )));
    }

    measurements
        .iter()
        .zip(offsets.as_slice())
        .map(|(m, &offset)| {
            let y = m.field(field).ok_or_else(|| TimecourseError::Schema {
                source_name: "measurements".to_string(),
                reason: format!("subject '{}' has no {} value", m.subject_id, field.name()),
            })?;
            Ok(ScatterPoint {
                subject_id: m.subject_id.clone(),
                group: m.group.clone(),
                day: m.day.value(),
                x: m.day.value() + offset,
                y,
            })
        })
        .collect()
}
