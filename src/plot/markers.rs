//! Post-treatment markers for annotating intervention days.

use crate::data::{Day, Measurement};
use std::collections::{BTreeMap, BTreeSet};

/// Sorted distinct days on which any measurement carries the post-treatment flag.
pub fn post_treatment_days(measurements: &[Measurement]) -> Vec<Day> {
    let days: BTreeSet<Day> = measurements
        .iter()
        .filter(|m| m.post_treatment)
        .map(|m| m.day)
        .collect();
    days.into_iter().collect()
}

/// Post-treatment days per treatment group.
///
/// Every group present in the data gets an entry, possibly empty (a control
/// group that never receives the intervention). Ungrouped rows are ignored.
pub fn post_treatment_days_by_group(measurements: &[Measurement]) -> BTreeMap<String, Vec<Day>> {
    let mut by_group: BTreeMap<String, BTreeSet<Day>> = BTreeMap::new();
    for m in measurements {
        if let Some(group) = &m.group {
            let days = by_group.entry(group.clone()).or_default();
            if m.post_treatment {
                days.insert(m.day);
            }
        }
    }
    by_group
        .into_iter()
        .map(|(g, days)| (g, days.into_iter().collect()))
        .collect()
}

/// First post-treatment day, if any.
pub fn first_post_treatment_day(measurements: &[Measurement]) -> Option<Day> {
    measurements
        .iter()
        .filter(|m| m.post_treatment)
        .map(|m| m.day)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Measurement> {
        vec![
            Measurement::new("v1", 3, 1.0).with_group("vancomycin").with_post_treatment(true),
            Measurement::new("v1", 0, 1.0).with_group("vancomycin"),
            Measurement::new("v2", 3, 1.0).with_group("vancomycin").with_post_treatment(true),
            Measurement::new("v2", 1, 1.0).with_group("vancomycin").with_post_treatment(true),
            Measurement::new("w1", 3, 1.0).with_group("water"),
        ]
    }

    #[test]
    fn test_post_treatment_days() {
        assert_eq!(post_treatment_days(&rows()), vec![Day(1.0), Day(3.0)]);
        assert_eq!(first_post_treatment_day(&rows()), Some(Day(1.0)));
    }

    #[test]
    fn test_by_group_includes_controls() {
        let by_group = post_treatment_days_by_group(&rows());
        assert_eq!(by_group["vancomycin"], vec![Day(1.0), Day(3.0)]);
        assert!(by_group["water"].is_empty());
    }

    #[test]
    fn test_no_flags() {
        let rows = vec![Measurement::new("m1", 0, 1.0)];
        assert!(post_treatment_days(&rows).is_empty());
        assert_eq!(first_post_treatment_day(&rows), None);
    }
}
