//! Integration tests for loading, summarizing and preparing plots of a
//! mouse antibiotic timecourse.

use abundance_timecourse::prelude::*;
use approx::assert_relative_eq;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

/// Two treatment groups, three mice each, four sampling days.
///
/// Vancomycin knocks the population down by 4 log units from day 3 on;
/// water controls stay flat. Values are exact powers of ten times a per-mouse
/// factor so log10 means are easy to check.
fn write_timecourse(delimiter: char) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let d = delimiter;
    writeln!(file, "day{d}mouse{d}group{d}yl32{d}post_antibiotic").unwrap();
    for (group, prefix, suppress) in [("vancomycin", "V", true), ("water", "W", false)] {
        for i in 1..=3 {
            for day in [0, 1, 3, 7] {
                let post = suppress && day >= 3;
                let value = if post { 1e2 * i as f64 } else { 1e6 * i as f64 };
                writeln!(
                    file,
                    "{day}{d}{prefix}{i}{d}{group}{d}{value}{d}{}",
                    if post { "True" } else { "False" }
                )
                .unwrap();
            }
        }
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_load_and_inspect() {
    let file = write_timecourse(',');
    let table = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap();

    assert_eq!(table.len(), 24);
    assert!(table.has_groups());
    assert_eq!(table.groups(), vec!["vancomycin".to_string(), "water".to_string()]);
    assert_eq!(table.days(), vec![Day(0.0), Day(1.0), Day(3.0), Day(7.0)]);

    // Row order is preserved
    assert_eq!(table.measurements()[0].subject_id, "V1");
    assert_eq!(table.measurements()[23].subject_id, "W3");

    let per_group = measurements_per_group(table.measurements()).unwrap();
    assert_eq!(per_group["vancomycin"], 12);
    let subjects = subjects_per_group(table.measurements()).unwrap();
    assert_eq!(subjects["water"], 3);
    let replicates = replicates_per_group_day(table.measurements()).unwrap();
    assert!(replicates.values().all(|&n| n == 3));

    assert_eq!(post_treatment_days(table.measurements()), vec![Day(3.0), Day(7.0)]);
    let by_group = post_treatment_days_by_group(table.measurements());
    assert!(by_group["water"].is_empty());

    let descriptions = describe_table(&table);
    assert_eq!(descriptions[0].name, "day");
    assert_eq!(descriptions[1].count, 24);
}

#[test]
fn test_tsv_matches_csv() {
    let csv = write_timecourse(',');
    let tsv = write_timecourse('\t');

    let a = MeasurementTable::load(csv.path(), &LoadOptions::csv()).unwrap();
    let b = MeasurementTable::load(tsv.path(), &LoadOptions::tsv()).unwrap();
    assert_eq!(a.measurements(), b.measurements());
}

#[test]
fn test_log10_summary_by_group_day() {
    let file = write_timecourse(',');
    let table = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap();
    let table = log10_table(&table).unwrap();

    let summaries = aggregate(table.measurements(), GroupBy::GroupDay, ValueField::Log10).unwrap();
    assert_eq!(summaries.len(), 8);

    let total: usize = summaries.iter().map(|s| s.count).sum();
    assert_eq!(total, table.len());

    // log10(1e6 * i) averaged over i = 1..3 is 6 + mean(log10 i)
    let offset = (2f64.log10() + 3f64.log10()) / 3.0;
    let first = &summaries[0];
    assert_eq!(first.key, GroupKey::GroupDay("vancomycin".to_string(), Day(0.0)));
    assert_relative_eq!(first.mean, 6.0 + offset, epsilon = 1e-12);

    let vanco_7 = summaries
        .iter()
        .find(|s| s.key == GroupKey::GroupDay("vancomycin".to_string(), Day(7.0)))
        .unwrap();
    assert_relative_eq!(vanco_7.mean, 2.0 + offset, epsilon = 1e-12);
    assert_relative_eq!(vanco_7.median, 2.0 + 2f64.log10(), epsilon = 1e-12);
}

#[test]
fn test_summary_independent_of_row_order() {
    let file = write_timecourse(',');
    let table = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap();

    let mut reversed = table.measurements().to_vec();
    reversed.reverse();

    let a = aggregate(table.measurements(), GroupBy::Day, ValueField::Raw).unwrap();
    let b = aggregate(&reversed, GroupBy::Day, ValueField::Raw).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.key, y.key);
        assert_eq!(x.mean.to_bits(), y.mean.to_bits());
        assert_eq!(x.std.to_bits(), y.std.to_bits());
    }
}

#[test]
fn test_nonpositive_values_need_explicit_drop() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "day,mouse,yl32").unwrap();
    writeln!(file, "0,m1,100").unwrap();
    writeln!(file, "1,m1,0").unwrap();
    writeln!(file, "2,m1,-5").unwrap();
    file.flush().unwrap();

    let table = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap();
    assert!(!table.has_groups());

    let err = log10_table(&table).unwrap_err();
    assert!(matches!(err, TimecourseError::Domain(_)));

    let (kept, report) = drop_nonpositive(table.measurements());
    assert_eq!(report.n_dropped(), 2);
    let cleaned = log10_table(&table.with_measurements(kept)).unwrap();
    assert_relative_eq!(cleaned.measurements()[0].log10_value.unwrap(), 2.0);
}

#[test]
fn test_jitter_is_repeatable_across_loads() {
    let file = write_timecourse(',');
    let options = LoadOptions::csv();
    let config = JitterConfig::default();

    let a = MeasurementTable::load(file.path(), &options).unwrap();
    let b = MeasurementTable::load(file.path(), &options).unwrap();

    let ja = jitter_seeded(a.measurements(), GroupBy::Day, &config).unwrap();
    let jb = jitter_seeded(b.measurements(), GroupBy::Day, &config).unwrap();
    assert_eq!(ja, jb);
    assert!(ja.as_slice().iter().all(|o| *o >= -0.4 && *o < 0.4));
}

#[test]
fn test_yaml_pipeline_end_to_end() {
    let file = write_timecourse('\t');
    let out = TempDir::new().unwrap();

    let yaml = Pipeline::group_means()
        .input(InputConfig {
            delimiter: '\t',
            columns: ColumnSchema::default(),
        })
        .to_config(Some("Group means"))
        .to_yaml()
        .unwrap();

    let config = PipelineConfig::from_yaml(&yaml).unwrap();
    let pipeline = Pipeline::from_config(&config);
    let table = pipeline.load(file.path()).unwrap();
    let result = pipeline.run(&table).unwrap();
    assert_eq!(result.name, "group-means");

    let written = result.write_outputs(out.path()).unwrap();
    assert_eq!(written.len(), 3);

    let summary = std::fs::read_to_string(out.path().join("summary_group_day_log10.tsv")).unwrap();
    let mut lines = summary.lines();
    assert_eq!(
        lines.next().unwrap(),
        "group\tday\tmean_log10_yl32\tmedian_log10_yl32\tstd_log10_yl32\tcount"
    );
    assert!(lines.next().unwrap().starts_with("vancomycin\t0\t"));

    let reloaded = MeasurementTable::load(out.path().join("measurements.csv"), &LoadOptions::csv())
        .unwrap();
    assert_eq!(reloaded.len(), 24);
}

#[test]
fn test_figures_from_file() {
    let file = write_timecourse(',');
    let table = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap();
    let table = log10_table(&table).unwrap();

    let fig = FigureData::group_means(&table, ValueField::Log10, Palette::OkabeIto, Some("water"))
        .unwrap();
    assert_eq!(fig.lines.len(), 2);
    assert_eq!(fig.styles["water"].color, "#999999");
    assert_ne!(fig.styles["vancomycin"].color, "#999999");

    let fig = FigureData::jittered_replicates(&table, ValueField::Log10, &JitterConfig::default())
        .unwrap();
    assert_eq!(fig.scatter.len(), 24);
    assert_eq!(fig.vertical_markers, vec![3.0, 7.0]);

    let out = NamedTempFile::new().unwrap();
    fig.write_json(out.path()).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
    assert_eq!(parsed["kind"], "jittered-replicates");

    let heat = FigureData::heatmap(&table, ValueField::Log10, Colormap::Viridis).unwrap();
    let pivot = heat.pivot.unwrap();
    assert_eq!(pivot.values.shape(), (2, 4));
    assert_relative_eq!(
        pivot.get("water", 7).unwrap() - pivot.get("vancomycin", 7).unwrap(),
        4.0,
        epsilon = 1e-12
    );
}

#[test]
fn test_missing_file_and_column() {
    let err = MeasurementTable::load("/nonexistent/qpcr.csv", &LoadOptions::csv()).unwrap_err();
    assert!(matches!(err, TimecourseError::MissingFile(_)));

    let file = write_timecourse(',');
    let options = LoadOptions::csv().with_columns(ColumnSchema {
        value: "cfu".to_string(),
        ..ColumnSchema::default()
    });
    let err = MeasurementTable::load(file.path(), &options).unwrap_err();
    assert!(matches!(err, TimecourseError::Schema { .. }));
}
