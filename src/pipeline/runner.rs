//! Pipeline runner for composing and executing analysis steps.

use crate::aggregate::{aggregate, write_summaries, GroupBy, GroupSummary};
use crate::data::{ColumnSchema, Day, LoadOptions, MeasurementTable, ValueField};
use crate::error::{Result, TimecourseError};
use crate::plot::{jitter_seeded, post_treatment_days, scatter_points, JitterConfig, JitterOffsets};
use crate::transform::{drop_nonpositive, log10_table, DropReport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A step in the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisStep {
    /// Remove rows with non-positive values, logging each one.
    DropNonPositive,
    /// Add the log10 column.
    Log10,
    /// Aggregate mean/median/std/count.
    Summarize { by: GroupBy, field: ValueField },
    /// Draw seeded display offsets.
    Jitter { by: GroupBy, range: f64, seed: u64 },
    /// Collect days flagged as post-treatment.
    MarkPostTreatment,
}

/// How the pipeline's input file is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub delimiter: char,
    pub columns: ColumnSchema,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            columns: ColumnSchema::default(),
        }
    }
}

impl InputConfig {
    /// Convert to load options.
    ///
    /// # Errors
    /// `InvalidParameter` if the delimiter is not a single ASCII character.
    pub fn load_options(&self) -> Result<LoadOptions> {
        if !self.delimiter.is_ascii() {
            return Err(TimecourseError::InvalidParameter(format!(
                "delimiter '{}' is not a single ASCII character",
                self.delimiter
            )));
        }
        Ok(LoadOptions {
            delimiter: self.delimiter as u8,
            columns: self.columns.clone(),
        })
    }
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Input format.
    #[serde(default)]
    pub input: InputConfig,
    /// Steps to execute.
    pub steps: Vec<AnalysisStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(TimecourseError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(TimecourseError::from)
    }
}

/// Builder for constructing and running analysis pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<AnalysisStep>,
    input: InputConfig,
    name: String,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            input: InputConfig::default(),
            name: "unnamed".to_string(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            input: config.input.clone(),
            name: config.name.clone(),
        }
    }

    /// Daily mean/median/std/count of raw abundance.
    pub fn daily_summary() -> Self {
        Self::new()
            .name("daily-summary")
            .summarize(GroupBy::Day, ValueField::Raw)
    }

    /// Log10 daily summaries, jittered replicates and post-treatment markers.
    pub fn jittered_replicates() -> Self {
        let jitter = JitterConfig::default();
        Self::new()
            .name("jittered-replicates")
            .log10()
            .summarize(GroupBy::Day, ValueField::Log10)
            .jitter(GroupBy::Day, jitter.range, jitter.seed)
            .mark_post_treatment()
    }

    /// Log10 mean trajectories per treatment group.
    pub fn group_means() -> Self {
        Self::new()
            .name("group-means")
            .log10()
            .summarize(GroupBy::GroupDay, ValueField::Log10)
            .mark_post_treatment()
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the input format.
    pub fn input(mut self, input: InputConfig) -> Self {
        self.input = input;
        self
    }

    /// Add explicit removal of non-positive values.
    pub fn drop_nonpositive(mut self) -> Self {
        self.steps.push(AnalysisStep::DropNonPositive);
        self
    }

    /// Add the log10 transform.
    pub fn log10(mut self) -> Self {
        self.steps.push(AnalysisStep::Log10);
        self
    }

    /// Add a grouped summary.
    pub fn summarize(mut self, by: GroupBy, field: ValueField) -> Self {
        self.steps.push(AnalysisStep::Summarize { by, field });
        self
    }

    /// Add seeded jitter.
    pub fn jitter(mut self, by: GroupBy, range: f64, seed: u64) -> Self {
        self.steps.push(AnalysisStep::Jitter { by, range, seed });
        self
    }

    /// Add post-treatment day collection.
    pub fn mark_post_treatment(mut self) -> Self {
        self.steps.push(AnalysisStep::MarkPostTreatment);
        self
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[AnalysisStep] {
        &self.steps
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description.map(String::from),
            input: self.input.clone(),
            steps: self.steps.clone(),
        }
    }

    /// Load the input file using this pipeline's input configuration.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<MeasurementTable> {
        MeasurementTable::load(path, &self.input.load_options()?)
    }

    /// Run the pipeline on a table.
    pub fn run(&self, table: &MeasurementTable) -> Result<AnalysisResult> {
        let mut state = PipelineState::new(table.clone());

        for (i, step) in self.steps.iter().enumerate() {
            state = state.apply(i + 1, step).map_err(|e| TimecourseError::Pipeline {
                step: i + 1,
                name: format!("{:?}", step),
                source: Box::new(e),
            })?;
        }

        info!("Pipeline '{}' finished {} steps", self.name, self.steps.len());
        Ok(state.finalize(&self.name))
    }
}

/// One grouped summary produced by a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOutput {
    /// 1-based position of the producing step.
    pub step: usize,
    pub by: GroupBy,
    pub field: ValueField,
    pub rows: Vec<GroupSummary>,
}

/// Jitter produced by a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct JitterOutput {
    pub by: GroupBy,
    pub offsets: JitterOffsets,
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub name: String,
    /// The table after all transforms.
    pub table: MeasurementTable,
    pub dropped: Option<DropReport>,
    pub summaries: Vec<SummaryOutput>,
    pub jitter: Option<JitterOutput>,
    pub post_treatment_days: Option<Vec<Day>>,
}

impl AnalysisResult {
    /// Write every output into `dir` and return the written paths.
    ///
    /// - `measurements.csv`: the transformed table
    /// - `summary_<by>_<field>.tsv`: one per summarize step, suffixed with
    ///   `_step<N>` when several steps share the same grouping and field
    /// - `scatter.json`: jittered points, if jitter ran
    /// - `post_treatment_days.json`: if markers were collected
    pub fn write_outputs<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        let path = dir.join("measurements.csv");
        self.table.write_delimited(&path, b',')?;
        written.push(path);

        for summary in &self.summaries {
            let by = match summary.by {
                GroupBy::Day => "day",
                GroupBy::GroupDay => "group_day",
            };
            let shared = self
                .summaries
                .iter()
                .filter(|s| s.by == summary.by && s.field == summary.field)
                .count()
                > 1;
            let file_name = if shared {
                format!("summary_{}_{}_step{}.tsv", by, summary.field.name(), summary.step)
            } else {
                format!("summary_{}_{}.tsv", by, summary.field.name())
            };
            let path = dir.join(file_name);
            let label = match summary.field {
                ValueField::Raw => self.table.columns().value.clone(),
                ValueField::Log10 => self.table.columns().log10_column(),
            };
            write_summaries(&path, &summary.rows, &label, b'\t')?;
            written.push(path);
        }

        if let Some(jitter) = &self.jitter {
            let field = if self.table.has_log10() {
                ValueField::Log10
            } else {
                ValueField::Raw
            };
            let points = scatter_points(self.table.measurements(), &jitter.offsets, field)?;
            let path = dir.join("scatter.json");
            std::fs::write(&path, serde_json::to_string_pretty(&points)?)?;
            written.push(path);
        }

        if let Some(days) = &self.post_treatment_days {
            let path = dir.join("post_treatment_days.json");
            std::fs::write(&path, serde_json::to_string_pretty(days)?)?;
            written.push(path);
        }

        info!("Wrote {} output files to {}", written.len(), dir.display());
        Ok(written)
    }
}

/// Internal state during pipeline execution.
struct PipelineState {
    table: MeasurementTable,
    dropped: Option<DropReport>,
    summaries: Vec<SummaryOutput>,
    jitter: Option<JitterOutput>,
    post_treatment_days: Option<Vec<Day>>,
}

impl PipelineState {
    fn new(table: MeasurementTable) -> Self {
        Self {
            table,
            dropped: None,
            summaries: Vec::new(),
            jitter: None,
            post_treatment_days: None,
        }
    }

    fn apply(mut self, ordinal: usize, step: &AnalysisStep) -> Result<Self> {
        match step {
            AnalysisStep::DropNonPositive => {
                let (kept, report) = drop_nonpositive(self.table.measurements());
                // Offsets index rows; dropping rows invalidates them.
                if report.n_dropped() > 0 && self.jitter.take().is_some() {
                    warn!("Discarding jitter drawn before non-positive rows were dropped");
                }
                self.table = self.table.with_measurements(kept);
                self.dropped = Some(report);
            }
            AnalysisStep::Log10 => {
                self.table = log10_table(&self.table)?;
            }
            AnalysisStep::Summarize { by, field } => {
                let rows = aggregate(self.table.measurements(), *by, *field)?;
                self.summaries.push(SummaryOutput {
                    step: ordinal,
                    by: *by,
                    field: *field,
                    rows,
                });
            }
            AnalysisStep::Jitter { by, range, seed } => {
                let config = JitterConfig {
                    range: *range,
                    seed: *seed,
                };
                let offsets = jitter_seeded(self.table.measurements(), *by, &config)?;
                self.jitter = Some(JitterOutput { by: *by, offsets });
            }
            AnalysisStep::MarkPostTreatment => {
                self.post_treatment_days = Some(post_treatment_days(self.table.measurements()));
            }
        }
        Ok(self)
    }

    fn finalize(self, name: &str) -> AnalysisResult {
        AnalysisResult {
            name: name.to_string(),
            table: self.table,
            dropped: self.dropped,
            summaries: self.summaries,
            jitter: self.jitter,
            post_treatment_days: self.post_treatment_days,
        }
    }
}
