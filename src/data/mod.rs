//! Data structures for longitudinal abundance measurements.

mod measurement;
mod schema;
mod table;

pub use measurement::{Day, Measurement, ValueField};
pub use schema::{parse_delimiter, ColumnSchema, LoadOptions};
pub use table::MeasurementTable;
