//! Colorblind-safe palettes and redundant style encoding.
//!
//! Colors alone fail for roughly one viewer in twelve, so series styles also
//! vary marker shape and line dash. Control groups get a neutral gray.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Neutral gray used for control groups.
pub const CONTROL_COLOR: &str = "#999999";

/// Categorical palettes designed to stay distinguishable under color vision deficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Palette {
    /// Okabe & Ito, 8 colors.
    OkabeIto,
    /// Paul Tol "bright", 7 colors.
    TolBright,
    /// Paul Tol "muted", 10 colors.
    TolMuted,
    /// IBM Design Library, 5 colors.
    Ibm,
}

impl Palette {
    /// Every palette, in display order.
    pub const ALL: [Palette; 4] = [
        Palette::OkabeIto,
        Palette::TolBright,
        Palette::TolMuted,
        Palette::Ibm,
    ];

    /// Hex colors in palette order.
    pub fn colors(&self) -> &'static [&'static str] {
        match self {
            Self::OkabeIto => &[
                "#E69F00", "#56B4E9", "#009E73", "#F0E442", "#0072B2", "#D55E00", "#CC79A7",
                "#999999",
            ],
            Self::TolBright => &[
                "#4477AA", "#EE6677", "#228833", "#CCBB44", "#66CCEE", "#AA3377", "#BBBBBB",
            ],
            Self::TolMuted => &[
                "#332288", "#88CCEE", "#44AA99", "#117733", "#999933", "#DDCC77", "#CC6677",
                "#882255", "#AA4499", "#DDDDDD",
            ],
            Self::Ibm => &["#648FFF", "#785EF0", "#DC267F", "#FE6100", "#FFB000"],
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OkabeIto => "Okabe-Ito",
            Self::TolBright => "Tol Bright",
            Self::TolMuted => "Tol Muted",
            Self::Ibm => "IBM Design",
        }
    }

    /// Colors usable for data series: the palette minus the control gray.
    fn series_colors(&self) -> Vec<&'static str> {
        self.colors()
            .iter()
            .copied()
            .filter(|c| *c != CONTROL_COLOR)
            .collect()
    }
}

impl std::str::FromStr for Palette {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "okabe-ito" | "okabe" => Ok(Self::OkabeIto),
            "tol-bright" | "bright" => Ok(Self::TolBright),
            "tol-muted" | "muted" => Ok(Self::TolMuted),
            "ibm" | "ibm-design" => Ok(Self::Ibm),
            other => Err(format!(
                "unknown palette '{}'. Use: okabe-ito, tol-bright, tol-muted, ibm",
                other
            )),
        }
    }
}

/// Sequential colormaps for heatmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    Viridis,
    Cividis,
    Jet,
}

impl Colormap {
    /// Name as understood by common charting libraries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Viridis => "viridis",
            Self::Cividis => "cividis",
            Self::Jet => "jet",
        }
    }

    /// Whether equal data steps look like equal color steps.
    pub fn is_perceptually_uniform(&self) -> bool {
        !matches!(self, Self::Jet)
    }

    /// Whether the map is tuned for color vision deficiency.
    pub fn is_cvd_optimized(&self) -> bool {
        matches!(self, Self::Cividis)
    }
}

/// Marker shapes, cycled alongside colors.
pub const MARKERS: [&str; 8] = ["o", "s", "^", "D", "v", "P", "X", "*"];

/// Line dash styles, cycled alongside colors.
pub const LINE_STYLES: [&str; 4] = ["-", "--", "-.", ":"];

/// Visual encoding of one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesStyle {
    pub color: String,
    pub marker: String,
    pub line_style: String,
}

/// Assign a color, marker and line style to each label.
///
/// Labels are styled in sorted order so the same set of labels always
/// receives the same styles. Colors cycle through the palette (skipping its
/// gray); markers and line styles cycle independently, so two labels never
/// share all three channels until the palette has been exhausted. The
/// optional `control` label is drawn gray with a dotted line.
pub fn assign_styles<S: AsRef<str>>(
    labels: &[S],
    palette: Palette,
    control: Option<&str>,
) -> BTreeMap<String, SeriesStyle> {
    let mut sorted: Vec<&str> = labels.iter().map(|l| l.as_ref()).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let colors = palette.series_colors();
    let mut styles = BTreeMap::new();
    let mut slot = 0;

    for label in sorted {
        let style = if Some(label) == control {
            SeriesStyle {
                color: CONTROL_COLOR.to_string(),
                marker: MARKERS[MARKERS.len() - 1].to_string(),
                line_style: ":".to_string(),
            }
        } else {
            let style = SeriesStyle {
                color: colors[slot % colors.len()].to_string(),
                marker: MARKERS[slot % MARKERS.len()].to_string(),
                line_style: LINE_STYLES[slot % LINE_STYLES.len()].to_string(),
            };
            slot += 1;
            style
        };
        styles.insert(label.to_string(), style);
    }
    styles
}
