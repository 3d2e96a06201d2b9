//! Grouped summaries, column descriptions and count tables.

pub mod counts;
mod describe;
mod stats;
mod summary;

pub use counts::{
    measurements_per_group, measurements_per_subject, replicates_per_group_day,
    subjects_per_group,
};
pub use describe::{describe, describe_table, ColumnDescription};
pub use stats::{mean, median, quantile, sample_std};
pub use summary::{aggregate, write_summaries, GroupBy, GroupKey, GroupSummary};
