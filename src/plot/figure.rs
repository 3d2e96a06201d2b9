//! Plot-ready figure descriptions, serialized as JSON for a charting surface.

use crate::aggregate::{aggregate, GroupBy};
use crate::data::{MeasurementTable, ValueField};
use crate::error::Result;
use crate::plot::jitter::{jitter_seeded, scatter_points, JitterConfig, ScatterPoint};
use crate::plot::markers::post_treatment_days;
use crate::plot::palette::{assign_styles, Colormap, Palette, SeriesStyle};
use crate::plot::series::{
    facets, group_mean_pivot, mean_trajectories, median_trajectories, trajectories, Facet,
    PivotTable, Trajectory,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// What kind of chart a [`FigureData`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FigureKind {
    /// One line per subject.
    Trajectories,
    /// Jittered replicate scatter with daily mean and median lines.
    JitteredReplicates,
    /// One panel per treatment group.
    Facets,
    /// One mean line per treatment group.
    GroupMeans,
    /// Groups x days heatmap of means.
    Heatmap,
}

/// Everything a charting surface needs to draw one figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureData {
    pub kind: FigureKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Line series (subjects, or summary lines).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Trajectory>,
    /// Jittered points.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scatter: Vec<ScatterPoint>,
    /// Panels, for faceted figures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,
    /// Days to mark with vertical lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertical_markers: Vec<f64>,
    /// Style per series label.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, SeriesStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<PivotTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colormap: Option<Colormap>,
}

impl FigureData {
    fn empty(kind: FigureKind, title: String, y_label: String) -> Self {
        Self {
            kind,
            title,
            x_label: "Day".to_string(),
            y_label,
            lines: Vec::new(),
            scatter: Vec::new(),
            facets: Vec::new(),
            vertical_markers: Vec::new(),
            styles: BTreeMap::new(),
            pivot: None,
            colormap: None,
        }
    }

    /// One line per subject, styled per subject.
    pub fn trajectories(table: &MeasurementTable, field: ValueField, palette: Palette) -> Result<Self> {
        let lines = trajectories(table.measurements(), field)?;
        let labels: Vec<&str> = lines.iter().map(|t| t.label.as_str()).collect();
        let styles = assign_styles(&labels, palette, None);

        let mut fig = Self::empty(
            FigureKind::Trajectories,
            format!("{} over time by subject", table.columns().value),
            y_label(table, field),
        );
        fig.lines = lines;
        fig.styles = styles;
        Ok(fig)
    }

    /// Jittered replicates plus daily mean and median lines and post-treatment markers.
    pub fn jittered_replicates(
        table: &MeasurementTable,
        field: ValueField,
        jitter: &JitterConfig,
    ) -> Result<Self> {
        let rows = table.measurements();
        let offsets = jitter_seeded(rows, GroupBy::Day, jitter)?;
        let scatter = scatter_points(rows, &offsets, field)?;

        let daily = aggregate(rows, GroupBy::Day, field)?;
        let mut lines = Vec::new();
        for (label, mut line) in [
            ("Daily mean", mean_trajectories(&daily)),
            ("Daily median", median_trajectories(&daily)),
        ] {
            if let Some(mut t) = line.pop() {
                t.label = label.to_string();
                lines.push(t);
            }
        }

        let mut styles = BTreeMap::new();
        styles.insert(
            "Daily mean".to_string(),
            SeriesStyle {
                color: "#000000".to_string(),
                marker: "o".to_string(),
                line_style: "-".to_string(),
            },
        );
        styles.insert(
            "Daily median".to_string(),
            SeriesStyle {
                color: "#000000".to_string(),
                marker: "s".to_string(),
                line_style: "--".to_string(),
            },
        );

        let mut fig = Self::empty(
            FigureKind::JitteredReplicates,
            format!("Daily {} with mean/median overlays", y_label(table, field)),
            y_label(table, field),
        );
        fig.lines = lines;
        fig.scatter = scatter;
        fig.vertical_markers = post_treatment_days(rows).into_iter().map(|d| d.value()).collect();
        fig.styles = styles;
        Ok(fig)
    }

    /// One panel per treatment group.
    pub fn facets(table: &MeasurementTable, field: ValueField, palette: Palette) -> Result<Self> {
        let facets = facets(table.measurements(), field)?;
        let subjects = table.subjects();
        let styles = assign_styles(&subjects, palette, None);

        let mut fig = Self::empty(
            FigureKind::Facets,
            format!("{} dynamics across treatment groups", y_label(table, field)),
            y_label(table, field),
        );
        fig.facets = facets;
        fig.styles = styles;
        Ok(fig)
    }

    /// Mean trajectory per treatment group.
    pub fn group_means(
        table: &MeasurementTable,
        field: ValueField,
        palette: Palette,
        control: Option<&str>,
    ) -> Result<Self> {
        let summaries = aggregate(table.measurements(), GroupBy::GroupDay, field)?;
        let lines = mean_trajectories(&summaries);
        let groups = table.groups();

        let mut fig = Self::empty(
            FigureKind::GroupMeans,
            format!("Mean {} trajectories by treatment group", y_label(table, field)),
            format!("Mean {}", y_label(table, field)),
        );
        fig.lines = lines;
        fig.styles = assign_styles(&groups, palette, control);
        Ok(fig)
    }

    /// Groups x days heatmap of means.
    pub fn heatmap(table: &MeasurementTable, field: ValueField, colormap: Colormap) -> Result<Self> {
        let summaries = aggregate(table.measurements(), GroupBy::GroupDay, field)?;
        let pivot = group_mean_pivot(&summaries)?;

        let mut fig = Self::empty(
            FigureKind::Heatmap,
            format!("Mean {} by group and day", y_label(table, field)),
            "Treatment".to_string(),
        );
        fig.pivot = Some(pivot);
        fig.colormap = Some(colormap);
        Ok(fig)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty JSON to a file.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        info!("Wrote {:?} figure to {}", self.kind, path.as_ref().display());
        Ok(())
    }
}

fn y_label(table: &MeasurementTable, field: ValueField) -> String {
    match field {
        ValueField::Raw => table.columns().value.clone(),
        ValueField::Log10 => format!("log10({})", table.columns().value),
    }
}
