//! Loading and writing delimited measurement tables.

use crate::data::measurement::{Day, Measurement};
use crate::data::schema::{ColumnSchema, LoadOptions};
use crate::error::{Result, TimecourseError};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// An ordered sequence of measurements together with the columns they came from.
///
/// Rows keep their input order. Transformations never mutate a table; they
/// produce a new one via [`MeasurementTable::with_measurements`].
#[derive(Debug, Clone)]
pub struct MeasurementTable {
    /// Where the rows came from (file name or a caller-supplied label).
    source: String,
    /// Column names used for reading and writing.
    columns: ColumnSchema,
    measurements: Vec<Measurement>,
}

impl MeasurementTable {
    /// Build a table from in-memory measurements.
    pub fn new(source: impl Into<String>, columns: ColumnSchema, measurements: Vec<Measurement>) -> Self {
        Self {
            source: source.into(),
            columns,
            measurements,
        }
    }

    /// Load a table from a delimited file.
    ///
    /// Expected format:
    /// - First row: header naming the columns in `options.columns`
    /// - Subsequent rows: one measurement each, in any column order
    ///
    /// Extra columns are ignored. Missing `group`/`flag` columns are allowed.
    pub fn load<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TimecourseError::MissingFile(path.to_path_buf()));
        }
        let source = path.display().to_string();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let header = reader.headers()?.clone();
        let columns = &options.columns;
        let find = |name: &str| header.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| TimecourseError::missing_column(source.clone(), name))
        };

        let day_idx = require(&columns.day)?;
        let subject_idx = require(&columns.subject)?;
        let value_idx = require(&columns.value)?;
        let group_idx = find(&columns.group);
        let flag_idx = find(&columns.flag);
        debug!(
            "{}: header {:?} (group column {}, flag column {})",
            source,
            header.iter().collect::<Vec<_>>(),
            if group_idx.is_some() { "present" } else { "absent" },
            if flag_idx.is_some() { "present" } else { "absent" },
        );

        let mut measurements = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            // Row numbers in messages are 1-based data rows (header excluded).
            let row = row_idx + 1;
            let cell = |idx: usize| record.get(idx).unwrap_or("");

            let day = parse_number(&source, &columns.day, row, cell(day_idx))?;
            let value = parse_number(&source, &columns.value, row, cell(value_idx))?;
            let subject_id = cell(subject_idx);
            if subject_id.is_empty() {
                return Err(TimecourseError::Schema {
                    source_name: source.clone(),
                    reason: format!("empty '{}' at row {}", columns.subject, row),
                });
            }
            let group = group_idx
                .map(cell)
                .filter(|g| !g.is_empty())
                .map(str::to_string);
            let post_treatment = match flag_idx {
                Some(idx) => parse_flag(&source, &columns.flag, row, cell(idx))?,
                None => false,
            };

            measurements.push(Measurement {
                subject_id: subject_id.to_string(),
                day: Day::new(day),
                group,
                value,
                post_treatment,
                log10_value: None,
            });
        }

        if measurements.is_empty() {
            return Err(TimecourseError::EmptyData(format!("no rows in {}", source)));
        }

        info!("Loaded {} measurements from {}", measurements.len(), source);
        Ok(Self {
            source,
            columns: columns.clone(),
            measurements,
        })
    }

    /// Return a new table over different rows, keeping source and columns.
    pub fn with_measurements(&self, measurements: Vec<Measurement>) -> Self {
        Self {
            source: self.source.clone(),
            columns: self.columns.clone(),
            measurements,
        }
    }

    /// Source label.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Column names.
    pub fn columns(&self) -> &ColumnSchema {
        &self.columns
    }

    /// All measurements in input order.
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> &[Measurement] {
        &self.measurements[..n.min(self.measurements.len())]
    }

    /// True if every row carries a treatment group.
    pub fn has_groups(&self) -> bool {
        !self.measurements.is_empty() && self.measurements.iter().all(|m| m.group.is_some())
    }

    /// True if every row carries a derived log10 value.
    pub fn has_log10(&self) -> bool {
        !self.measurements.is_empty() && self.measurements.iter().all(|m| m.log10_value.is_some())
    }

    /// Distinct subject identifiers, sorted.
    pub fn subjects(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.measurements.iter().map(|m| m.subject_id.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    /// Distinct treatment groups, sorted.
    pub fn groups(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .measurements
            .iter()
            .filter_map(|m| m.group.as_deref())
            .collect();
        set.into_iter().map(String::from).collect()
    }

    /// Distinct days, ascending.
    pub fn days(&self) -> Vec<Day> {
        let set: BTreeSet<Day> = self.measurements.iter().map(|m| m.day).collect();
        set.into_iter().collect()
    }

    /// Write the table, including the log10 column when it has been computed.
    pub fn write_delimited<P: AsRef<Path>>(&self, path: P, delimiter: u8) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(path.as_ref())?;

        let with_group = self.measurements.iter().any(|m| m.group.is_some());
        let with_log10 = self.has_log10();

        let mut header = vec![
            self.columns.day.clone(),
            self.columns.subject.clone(),
        ];
        if with_group {
            header.push(self.columns.group.clone());
        }
        header.push(self.columns.value.clone());
        header.push(self.columns.flag.clone());
        if with_log10 {
            header.push(self.columns.log10_column());
        }
        writer.write_record(&header)?;

        for m in &self.measurements {
            let mut row = vec![m.day.to_string(), m.subject_id.clone()];
            if with_group {
                row.push(m.group.clone().unwrap_or_default());
            }
            row.push(m.value.to_string());
            row.push(if m.post_treatment { "True" } else { "False" }.to_string());
            if with_log10 {
                row.push(m.log10_value.map(|v| v.to_string()).unwrap_or_default());
            }
            writer.write_record(&row)?;
        }
        writer.flush()?;

        info!("Wrote {} rows to {}", self.len(), path.as_ref().display());
        Ok(())
    }
}

impl fmt::Display for MeasurementTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}  {:<10}", self.columns.day, self.columns.subject)?;
        let with_group = self.measurements.iter().any(|m| m.group.is_some());
        if with_group {
            write!(f, "  {:<14}", self.columns.group)?;
        }
        write!(f, "  {:>14}  {:<6}", self.columns.value, self.columns.flag)?;
        let with_log10 = self.has_log10();
        if with_log10 {
            write!(f, "  {:>10}", self.columns.log10_column())?;
        }
        writeln!(f)?;

        for m in &self.measurements {
            write!(f, "{:>6}  {:<10}", m.day.to_string(), m.subject_id)?;
            if with_group {
                write!(f, "  {:<14}", m.group.as_deref().unwrap_or("-"))?;
            }
            write!(f, "  {:>14}  {:<6}", m.value, m.post_treatment)?;
            if with_log10 {
                match m.log10_value {
                    Some(v) => write!(f, "  {:>10.4}", v)?,
                    None => write!(f, "  {:>10}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parse a finite number; `nan` and `inf` are rejected like any other text.
fn parse_number(source: &str, column: &str, row: usize, raw: &str) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(TimecourseError::Schema {
            source_name: source.to_string(),
            reason: format!("column '{}' row {}: '{}' is not a finite number", column, row, raw),
        }),
    }
}

fn parse_flag(source: &str, column: &str, row: usize, raw: &str) -> Result<bool> {
    match raw {
        "true" | "True" | "TRUE" | "1" | "yes" | "Yes" => Ok(true),
        "false" | "False" | "FALSE" | "0" | "no" | "No" | "" => Ok(false),
        other => Err(TimecourseError::Schema {
            source_name: source.to_string(),
            reason: format!("column '{}' row {}: '{}' is not a boolean", column, row, other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, GroupBy};
    use crate::data::ValueField;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_single_cohort() {
        let file = write_file(
            "day,mouse,yl32,post_antibiotic\n\
             0,mouse1,120000,False\n\
             1,mouse1,90000,False\n\
             3,mouse1,15,True\n",
        );
        let table = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap();

        assert_eq!(table.len(), 3);
        assert!(!table.has_groups());
        assert_eq!(table.measurements()[2].day, Day(3.0));
        assert_eq!(table.measurements()[2].value, 15.0);
        assert!(table.measurements()[2].post_treatment);
        assert!(!table.measurements()[0].post_treatment);
        assert_eq!(table.subjects(), vec!["mouse1".to_string()]);
    }

    #[test]
    fn test_load_preserves_row_order() {
        let file = write_file(
            "mouse\tday\tgroup\tyl32\n\
             m2\t5\twater\t10\n\
             m1\t0\tvancomycin\t20\n\
             m3\t2\twater\t30\n",
        );
        let table = MeasurementTable::load(file.path(), &LoadOptions::tsv()).unwrap();

        let subjects: Vec<&str> = table.measurements().iter().map(|m| m.subject_id.as_str()).collect();
        assert_eq!(subjects, vec!["m2", "m1", "m3"]);
        assert!(table.has_groups());
        assert_eq!(table.groups(), vec!["vancomycin".to_string(), "water".to_string()]);
        assert_eq!(table.days(), vec![Day(0.0), Day(2.0), Day(5.0)]);
    }

    #[test]
    fn test_custom_delimiter_and_columns() {
        let file = write_file("t;subject;abundance\n0;A;5\n1;A;6\n");
        let columns = ColumnSchema {
            day: "t".into(),
            subject: "subject".into(),
            value: "abundance".into(),
            ..ColumnSchema::default()
        };
        let options = LoadOptions::default().with_delimiter(b';').with_columns(columns);
        let table = MeasurementTable::load(file.path(), &options).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.measurements()[1].value, 6.0);
    }

    #[test]
    fn test_missing_file() {
        let result = MeasurementTable::load("/nonexistent/yl32.csv", &LoadOptions::csv());
        assert!(matches!(result, Err(TimecourseError::MissingFile(_))));
    }

    #[test]
    fn test_missing_required_column() {
        let file = write_file("day,subject,yl32\n0,m1,5\n");
        let err = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap_err();
        match err {
            TimecourseError::Schema { reason, .. } => assert!(reason.contains("'mouse'")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_mistyped_value() {
        let file = write_file("day,mouse,yl32\n0,m1,lots\n");
        let err = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap_err();
        match err {
            TimecourseError::Schema { reason, .. } => {
                assert!(reason.contains("yl32"));
                assert!(reason.contains("lots"));
                assert!(reason.contains("row 1"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        for contents in [
            "day,mouse,yl32\nnan,m1,100\n",
            "day,mouse,yl32\n0,m1,inf\n",
            "day,mouse,yl32\n0,m1,5\n1,m1,NaN\n",
            "day,mouse,yl32\n-inf,m1,5\n",
        ] {
            let file = write_file(contents);
            let err = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap_err();
            match err {
                TimecourseError::Schema { reason, .. } => {
                    assert!(reason.contains("not a finite number"), "{}", reason)
                }
                other => panic!("expected schema error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_negative_zero_day_joins_day_zero() {
        let file = write_file("day,mouse,yl32\n-0,m3,5\n0,m4,7\n");
        let table = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap();

        assert_eq!(table.days(), vec![Day(0.0)]);
        assert!(table.measurements()[0].day.value().is_sign_positive());

        let summaries = aggregate(table.measurements(), GroupBy::Day, ValueField::Raw).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].mean, 6.0);
    }

    #[test]
    fn test_invalid_flag() {
        let file = write_file("day,mouse,yl32,post_antibiotic\n0,m1,5,False\n1,m1,6,maybe\n");
        let err = MeasurementTable::load(file.path(), &LoadOptions::csv()).unwrap_err();
        match err {
            TimecourseError::Schema { reason, .. } => {
                assert!(reason.contains("post_antibiotic"));
                assert!(reason.contains("maybe"));
                assert!(reason.contains("row 2"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_header_only_is_empty() {
        let file = write_file("day,mouse,yl32\n");
        let result = MeasurementTable::load(file.path(), &LoadOptions::csv());
        assert!(matches!(result, Err(TimecourseError::EmptyData(_))));
    }

    #[test]
    fn test_write_then_reload() {
        let table = MeasurementTable::new(
            "memory",
            ColumnSchema::default(),
            vec![
                Measurement::new("m1", 0, 100.0).with_group("water"),
                Measurement::new("m1", 1, 10.0).with_group("water").with_post_treatment(true),
            ],
        );
        let out = NamedTempFile::new().unwrap();
        table.write_delimited(out.path(), b'\t').unwrap();

        let reloaded = MeasurementTable::load(out.path(), &LoadOptions::tsv()).unwrap();
        assert_eq!(reloaded.measurements(), table.measurements());
    }
}
