//! Plot-ready data: jitter, markers, series, palettes and figure descriptions.
//!
//! Nothing here rasterizes. The types describe what to draw and serialize to
//! JSON for whichever charting surface renders them.

pub mod figure;
pub mod jitter;
pub mod markers;
pub mod palette;
pub mod series;

pub use figure::{FigureData, FigureKind};
pub use jitter::{jitter, jitter_seeded, scatter_points, JitterConfig, JitterOffsets, ScatterPoint};
pub use markers::{first_post_treatment_day, post_treatment_days, post_treatment_days_by_group};
pub use palette::{assign_styles, Colormap, Palette, SeriesStyle, CONTROL_COLOR};
pub use series::{
    facets, group_mean_pivot, mean_trajectories, median_trajectories, trajectories, Facet,
    PivotTable, Trajectory,
};
