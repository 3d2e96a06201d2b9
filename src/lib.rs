//! Longitudinal Abundance Timecourse Library
//!
//! This library loads per-subject, per-day abundance measurements (for example
//! qPCR copy numbers from a mouse antibiotic experiment), derives log10 values,
//! aggregates them by day or by treatment group and day, and prepares
//! plot-ready data with colorblind-safe styling.
//!
//! # Overview
//!
//! - **data**: Measurements, column schema and delimited-file loading
//! - **transform**: log10 transform and explicit non-positive filtering
//! - **aggregate**: mean/median/std/count summaries, describe, count tables
//! - **plot**: seeded jitter, post-treatment markers, series, palettes, figures
//! - **pipeline**: Pipeline composition and YAML configuration
//!
//! # Example
//!
//! ```no_run
//! use abundance_timecourse::prelude::*;
//!
//! let table = MeasurementTable::load("qPCR_data.csv", &LoadOptions::csv()).unwrap();
//!
//! let result = Pipeline::new()
//!     .log10()
//!     .summarize(GroupBy::GroupDay, ValueField::Log10)
//!     .jitter(GroupBy::Day, 0.4, 42)
//!     .mark_post_treatment()
//!     .run(&table)
//!     .unwrap();
//!
//! for summary in &result.summaries[0].rows {
//!     println!("{}", summary);
//! }
//! ```

pub mod aggregate;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod transform;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::aggregate::{
        aggregate, describe, describe_table, write_summaries, ColumnDescription, GroupBy,
        GroupKey, GroupSummary,
        // Count tables
        measurements_per_group, measurements_per_subject, replicates_per_group_day,
        subjects_per_group,
    };
    pub use crate::data::{ColumnSchema, Day, LoadOptions, Measurement, MeasurementTable, ValueField};
    pub use crate::error::{Result, TimecourseError};
    pub use crate::pipeline::{AnalysisResult, AnalysisStep, InputConfig, Pipeline, PipelineConfig};
    pub use crate::plot::{
        assign_styles, facets, group_mean_pivot, jitter, jitter_seeded, mean_trajectories,
        post_treatment_days, post_treatment_days_by_group, scatter_points, trajectories,
        Colormap, FigureData, FigureKind, JitterConfig, JitterOffsets, Palette, PivotTable,
        ScatterPoint, SeriesStyle, Trajectory,
    };
    pub use crate::transform::{drop_nonpositive, log10_table, transform_log10, DropReport};
}
