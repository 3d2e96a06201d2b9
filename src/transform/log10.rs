//! Base-10 logarithm of abundance values.

use crate::data::{Measurement, MeasurementTable};
use crate::error::{Result, TimecourseError};
use tracing::debug;

/// Add `log10_value = log10(value)` to every measurement.
///
/// Returns a new vector; the input is left untouched. Every value must be
/// strictly positive. Use [`crate::transform::drop_nonpositive`] first if
/// zero-abundance rows should be excluded rather than rejected.
///
/// # Errors
/// `Domain` for the first measurement whose value is `<= 0`, NaN or infinite.
pub fn transform_log10(measurements: &[Measurement]) -> Result<Vec<Measurement>> {
    let mut out = Vec::with_capacity(measurements.len());
    for (idx, m) in measurements.iter().enumerate() {
        if !(m.value > 0.0 && m.value.is_finite()) {
            return Err(TimecourseError::Domain(format!(
                "log10 undefined for value {} (subject '{}', day {}, row {})",
                m.value,
                m.subject_id,
                m.day,
                idx + 1
            )));
        }
        let mut derived = m.clone();
        derived.log10_value = Some(m.value.log10());
        out.push(derived);
    }
    debug!("log10-transformed {} measurements", out.len());
    Ok(out)
}

/// Apply [`transform_log10`] to a whole table.
pub fn log10_table(table: &MeasurementTable) -> Result<MeasurementTable> {
    let transformed = transform_log10(table.measurements()).map_err(|e| match e {
        TimecourseError::Domain(msg) => TimecourseError::Domain(format!("{} in {}", msg, table.source())),
        other => other,
    })?;
    Ok(table.with_measurements(transformed))
}
