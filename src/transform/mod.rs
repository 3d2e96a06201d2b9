//! Value transformations over measurement sequences.

mod log10;
mod nonpositive;

pub use log10::{log10_table, transform_log10};
pub use nonpositive::{drop_nonpositive, DropReport};
