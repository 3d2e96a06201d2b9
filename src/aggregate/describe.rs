//! Column descriptions: count, moments and quartiles.

use crate::aggregate::stats::{mean, median, quantile, sample_std, sorted};
use crate::data::MeasurementTable;
use serde::{Deserialize, Serialize};

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    /// Column name.
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1). NaN for fewer than two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnDescription {
    /// Ratio of max to min, useful for spotting several orders of magnitude.
    pub fn dynamic_range(&self) -> f64 {
        if self.min > 0.0 {
            self.max / self.min
        } else {
            f64::INFINITY
        }
    }
}

/// Describe a column of values. Quartiles use linear interpolation.
pub fn describe(name: &str, values: &[f64]) -> ColumnDescription {
    let sorted = sorted(values);
    ColumnDescription {
        name: name.to_string(),
        count: sorted.len(),
        mean: mean(&sorted),
        std: sample_std(&sorted),
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q25: quantile(&sorted, 0.25),
        median: median(&sorted),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

/// Describe the numeric columns of a table: day, value, and log10 when present.
pub fn describe_table(table: &MeasurementTable) -> Vec<ColumnDescription> {
    let columns = table.columns();
    let rows = table.measurements();

    let days: Vec<f64> = rows.iter().map(|m| m.day.value()).collect();
    let values: Vec<f64> = rows.iter().map(|m| m.value).collect();
    let mut out = vec![describe(&columns.day, &days), describe(&columns.value, &values)];

    if table.has_log10() {
        let logs: Vec<f64> = rows.iter().filter_map(|m| m.log10_value).collect();
        out.push(describe(&columns.log10_column(), &logs));
    }
    out
}

impl std::fmt::Display for ColumnDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  count:  {}", self.count)?;
        writeln!(f, "  mean:   {:.4}", self.mean)?;
        writeln!(f, "  std:    {:.4}", self.std)?;
        writeln!(f, "  min:    {:.4}", self.min)?;
        writeln!(f, "  25%:    {:.4}", self.q25)?;
        writeln!(f, "  50%:    {:.4}", self.median)?;
        writeln!(f, "  75%:    {:.4}", self.q75)?;
        writeln!(f, "  max:    {:.4}", self.max)?;
        Ok(())
    }
}
