//! Per-subject, per-day abundance measurements.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A time offset in days.
///
/// Days may be irregularly spaced and fractional, so this wraps an `f64`.
/// Ordering uses `f64::total_cmp`, which makes `Day` usable as a map key.
/// `-0.0` and `0.0` are the same day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Day(pub f64);

impl Day {
    /// Wrap a day value, folding `-0.0` into `0.0`.
    pub fn new(value: f64) -> Self {
        Day(value + 0.0)
    }

    /// The underlying value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Day {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Day {}

impl PartialOrd for Day {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Day {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            Ordering::Equal
        } else {
            self.0.total_cmp(&other.0)
        }
    }
}

impl From<f64> for Day {
    fn from(value: f64) -> Self {
        Day::new(value)
    }
}

impl From<i32> for Day {
    fn from(value: i32) -> Self {
        Day(value as f64)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Which numeric column of a measurement to summarize or plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    /// Raw abundance count.
    Raw,
    /// Base-10 logarithm of the abundance (must be computed first).
    Log10,
}

impl ValueField {
    /// Column suffix used in output headers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Log10 => "log10",
        }
    }
}

/// One row of input data: a single subject measured on a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Subject identifier (e.g. a mouse label).
    pub subject_id: String,
    /// Time offset of the measurement.
    pub day: Day,
    /// Treatment group, absent in single-cohort datasets.
    pub group: Option<String>,
    /// Raw abundance.
    pub value: f64,
    /// True once the intervention day has passed for this subject.
    pub post_treatment: bool,
    /// Derived log10 abundance, set by [`crate::transform::transform_log10`].
    pub log10_value: Option<f64>,
}

impl Measurement {
    /// Create a measurement without a group or derived columns.
    pub fn new(subject_id: impl Into<String>, day: impl Into<Day>, value: f64) -> Self {
        Self {
            subject_id: subject_id.into(),
            day: day.into(),
            group: None,
            value,
            post_treatment: false,
            log10_value: None,
        }
    }

    /// Set the treatment group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the post-treatment flag.
    pub fn with_post_treatment(mut self, flag: bool) -> Self {
        self.post_treatment = flag;
        self
    }

    /// Read the selected numeric field, if it is available.
    pub fn field(&self, field: ValueField) -> Option<f64> {
        match field {
            ValueField::Raw => Some(self.value),
            ValueField::Log10 => self.log10_value,
        }
    }
}
