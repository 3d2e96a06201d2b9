//! Grouped summary statistics by day or by (group, day).

use crate::aggregate::stats::{mean, median, sample_std, sorted};
use crate::data::{Day, Measurement, ValueField};
use crate::error::{Result, TimecourseError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Grouping attributes for an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// One group per distinct day.
    Day,
    /// One group per distinct (treatment group, day) pair.
    GroupDay,
}

/// The key of one summary row.
///
/// Keys order ascending by tuple, which is the order summaries are returned in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Day(Day),
    GroupDay(String, Day),
}

impl GroupKey {
    /// Key of a measurement under the given grouping; `None` when the
    /// grouping needs a treatment group the measurement lacks.
    pub fn of(measurement: &Measurement, by: GroupBy) -> Option<Self> {
        match by {
            GroupBy::Day => Some(Self::Day(measurement.day)),
            GroupBy::GroupDay => measurement
                .group
                .as_ref()
                .map(|g| Self::GroupDay(g.clone(), measurement.day)),
        }
    }

    /// Day component of the key.
    pub fn day(&self) -> Day {
        match self {
            Self::Day(day) | Self::GroupDay(_, day) => *day,
        }
    }

    /// Group component of the key, if any.
    pub fn group(&self) -> Option<&str> {
        match self {
            Self::Day(_) => None,
            Self::GroupDay(group, _) => Some(group),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(day) => write!(f, "day {}", day),
            Self::GroupDay(group, day) => write!(f, "{} / day {}", group, day),
        }
    }
}

/// Summary statistics for all measurements sharing one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: GroupKey,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n-1 denominator). NaN when `count == 1`.
    pub std: f64,
    pub count: usize,
}

impl GroupSummary {
    /// Summarize one group's values.
    ///
    /// # Errors
    /// `EmptyGroup` if `values` is empty.
    pub fn from_values(key: GroupKey, values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(TimecourseError::EmptyGroup(key.to_string()));
        }
        let sorted = sorted(values);
        Ok(Self {
            mean: mean(&sorted),
            median: median(&sorted),
            std: sample_std(&sorted),
            count: sorted.len(),
            key,
        })
    }
}

impl fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<28} mean={:<12.4} median={:<12.4} std={:<12.4} n={}",
            self.key.to_string(),
            self.mean,
            self.median,
            self.std,
            self.count
        )
    }
}

/// Compute mean, median, sample std and count per key.
///
/// Returns one summary per distinct key present in `measurements`, sorted
/// ascending by key. The result does not depend on input row order.
///
/// # Errors
/// - `Schema` if `by` is [`GroupBy::GroupDay`] and a measurement has no group
/// - `Schema` if `field` is [`ValueField::Log10`] and the log10 column has
///   not been computed
pub fn aggregate(
    measurements: &[Measurement],
    by: GroupBy,
    field: ValueField,
) -> Result<Vec<GroupSummary>> {
    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();

    for (idx, m) in measurements.iter().enumerate() {
        let key = GroupKey::of(m, by).ok_or_else(|| TimecourseError::Schema {
            source_name: "measurements".to_string(),
            reason: format!(
                "row {} (subject '{}') has no treatment group; group+day aggregation needs one",
                idx + 1,
                m.subject_id
            ),
        })?;
        let value = m.field(field).ok_or_else(|| TimecourseError::Schema {
            source_name: "measurements".to_string(),
            reason: format!(
                "row {} (subject '{}') has no {} value; the log10 column has not been computed",
                idx + 1,
                m.subject_id,
                field.name()
            ),
        })?;
        groups.entry(key).or_default().push(value);
    }

    debug!(
        "Aggregating {} measurements into {} groups by {:?}",
        measurements.len(),
        groups.len(),
        by
    );

    groups
        .into_iter()
        .map(|(key, values)| GroupSummary::from_values(key, &values))
        .collect()
}

/// Write summaries as a delimited table.
///
/// Columns: `group` (for group+day keys), `day`, `mean_<label>`,
/// `median_<label>`, `std_<label>`, `count`. Undefined std is written `NaN`.
pub fn write_summaries<P: AsRef<Path>>(
    path: P,
    summaries: &[GroupSummary],
    value_label: &str,
    delimiter: u8,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path.as_ref())?;

    let with_group = summaries.iter().any(|s| s.key.group().is_some());
    let mut header = Vec::new();
    if with_group {
        header.push("group".to_string());
    }
    header.push("day".to_string());
    header.push(format!("mean_{}", value_label));
    header.push(format!("median_{}", value_label));
    header.push(format!("std_{}", value_label));
    header.push("count".to_string());
    writer.write_record(&header)?;

    for s in summaries {
        let mut row = Vec::with_capacity(header.len());
        if with_group {
            row.push(s.key.group().unwrap_or_default().to_string());
        }
        row.push(s.key.day().to_string());
        row.push(s.mean.to_string());
        row.push(s.median.to_string());
        row.push(s.std.to_string());
        row.push(s.count.to_string());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform_log10;
    use approx::assert_relative_eq;

    fn three_rows() -> Vec<Measurement> {
        vec![
            Measurement::new("m1", 0, 100.0),
            Measurement::new("m2", 0, 300.0),
            Measurement::new("m1", 1, 10.0),
        ]
    }

    fn multi_group() -> Vec<Measurement> {
        vec![
            Measurement::new("v1", 0, 1000.0).with_group("vancomycin"),
            Measurement::new("v2", 0, 3000.0).with_group("vancomycin"),
            Measurement::new("v1", 2, 10.0).with_group("vancomycin").with_post_treatment(true),
            Measurement::new("v2", 2, 30.0).with_group("vancomycin").with_post_treatment(true),
            Measurement::new("w1", 0, 2000.0).with_group("water"),
            Measurement::new("w1", 2, 2500.0).with_group("water"),
        ]
    }

    #[test]
    fn test_aggregate_by_day() {
        let summaries = aggregate(&three_rows(), GroupBy::Day, ValueField::Raw).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].key, GroupKey::Day(Day(0.0)));
        assert_relative_eq!(summaries[0].mean, 200.0);
        assert_relative_eq!(summaries[0].median, 200.0);
        assert_relative_eq!(summaries[0].std, 20000f64.sqrt(), epsilon = 1e-10);
        assert_eq!(summaries[0].count, 2);

        assert_eq!(summaries[1].key, GroupKey::Day(Day(1.0)));
        assert_relative_eq!(summaries[1].mean, 10.0);
        assert_eq!(summaries[1].count, 1);
        assert!(summaries[1].std.is_nan());
    }

    #[test]
    fn test_aggregate_by_group_day() {
        let summaries = aggregate(&multi_group(), GroupBy::GroupDay, ValueField::Raw).unwrap();

        let keys: Vec<String> = summaries.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "vancomycin / day 0",
                "vancomycin / day 2",
                "water / day 0",
                "water / day 2"
            ]
        );
        assert_relative_eq!(summaries[1].mean, 20.0);
        assert_eq!(summaries[2].count, 1);
        assert!(summaries[2].std.is_nan());
    }

    #[test]
    fn test_counts_partition_rows() {
        let rows = multi_group();
        for by in [GroupBy::Day, GroupBy::GroupDay] {
            let summaries = aggregate(&rows, by, ValueField::Raw).unwrap();
            let total: usize = summaries.iter().map(|s| s.count).sum();
            assert_eq!(total, rows.len());
            for s in &summaries {
                let expected = rows
                    .iter()
                    .filter(|m| GroupKey::of(m, by).as_ref() == Some(&s.key))
                    .count();
                assert_eq!(s.count, expected);
            }
        }
    }

    #[test]
    fn test_order_independent() {
        let rows = transform_log10(&multi_group()).unwrap();
        let mut reversed = rows.clone();
        reversed.reverse();
        let mut rotated = rows.clone();
        rotated.rotate_left(2);

        for field in [ValueField::Raw, ValueField::Log10] {
            let a = aggregate(&rows, GroupBy::GroupDay, field).unwrap();
            let b = aggregate(&reversed, GroupBy::GroupDay, field).unwrap();
            let c = aggregate(&rotated, GroupBy::GroupDay, field).unwrap();
            for ((x, y), z) in a.iter().zip(&b).zip(&c) {
                assert_eq!(x.key, y.key);
                assert_eq!(x.mean.to_bits(), y.mean.to_bits());
                assert_eq!(x.mean.to_bits(), z.mean.to_bits());
                assert_eq!(x.median.to_bits(), z.median.to_bits());
                assert_eq!(x.std.to_bits(), z.std.to_bits());
                assert_eq!(x.count, z.count);
            }
        }
    }

    #[test]
    fn test_log10_field_requires_transform() {
        let err = aggregate(&three_rows(), GroupBy::Day, ValueField::Log10).unwrap_err();
        assert!(matches!(err, TimecourseError::Schema { .. }));

        let transformed = transform_log10(&three_rows()).unwrap();
        let summaries = aggregate(&transformed, GroupBy::Day, ValueField::Log10).unwrap();
        assert_relative_eq!(summaries[1].mean, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_group_day_without_groups() {
        let err = aggregate(&three_rows(), GroupBy::GroupDay, ValueField::Raw).unwrap_err();
        match err {
            TimecourseError::Schema { reason, .. } => assert!(reason.contains("no treatment group")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_group_guard() {
        let err = GroupSummary::from_values(GroupKey::Day(Day(4.0)), &[]).unwrap_err();
        assert!(matches!(err, TimecourseError::EmptyGroup(_)));
    }

    #[test]
    fn test_empty_input() {
        let summaries = aggregate(&[], GroupBy::Day, ValueField::Raw).unwrap();
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_write_summaries() {
        let summaries = aggregate(&multi_group(), GroupBy::GroupDay, ValueField::Raw).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        write_summaries(file.path(), &summaries, "yl32", b',').unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "group,day,mean_yl32,median_yl32,std_yl32,count"
        );
        assert_eq!(lines.next().unwrap().split(',').next().unwrap(), "vancomycin");
        assert!(text.contains("water,0,2000,2000,NaN,1"));
    }
}
