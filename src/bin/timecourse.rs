//! timecourse - Longitudinal Abundance CLI
//!
//! Command-line interface for inspecting, summarizing and preparing plots of
//! per-subject abundance timecourses.

use abundance_timecourse::aggregate::{
    aggregate, describe_table, measurements_per_group, measurements_per_subject,
    replicates_per_group_day, subjects_per_group, write_summaries, GroupBy,
};
use abundance_timecourse::data::{parse_delimiter, ColumnSchema, LoadOptions, MeasurementTable, ValueField};
use abundance_timecourse::error::{Result, TimecourseError};
use abundance_timecourse::pipeline::{Pipeline, PipelineConfig};
use abundance_timecourse::plot::{
    post_treatment_days, post_treatment_days_by_group, Colormap, FigureData, JitterConfig, Palette,
    CONTROL_COLOR,
};
use abundance_timecourse::transform::{drop_nonpositive, log10_table};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// CLI-friendly grouping
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliGroupBy {
    /// One row per day
    Day,
    /// One row per treatment group and day
    GroupDay,
}

impl From<CliGroupBy> for GroupBy {
    fn from(by: CliGroupBy) -> Self {
        match by {
            CliGroupBy::Day => GroupBy::Day,
            CliGroupBy::GroupDay => GroupBy::GroupDay,
        }
    }
}

/// CLI-friendly figure kind
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFigure {
    /// One line per subject
    Trajectories,
    /// Jittered replicates with daily mean/median lines
    Jitter,
    /// One panel per treatment group
    Facets,
    /// Mean trajectory per treatment group
    GroupMeans,
    /// Groups x days heatmap of means
    Heatmap,
}

/// CLI-friendly colormap
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliColormap {
    Viridis,
    Cividis,
    Jet,
}

impl From<CliColormap> for Colormap {
    fn from(map: CliColormap) -> Self {
        match map {
            CliColormap::Viridis => Colormap::Viridis,
            CliColormap::Cividis => Colormap::Cividis,
            CliColormap::Jet => Colormap::Jet,
        }
    }
}

/// CLI-friendly preset
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPreset {
    DailySummary,
    JitteredReplicates,
    GroupMeans,
}

/// How to read the input table
#[derive(Debug, Clone, Args)]
struct InputArgs {
    /// Path to the measurement table (CSV by default)
    #[arg(short, long)]
    input: PathBuf,

    /// Field delimiter: a single character, or tab/comma/semicolon/space
    #[arg(short, long, default_value = ",")]
    delimiter: String,

    /// Column holding the day
    #[arg(long, default_value = "day")]
    day_column: String,

    /// Column holding the subject id
    #[arg(long, default_value = "mouse")]
    subject_column: String,

    /// Column holding the abundance value
    #[arg(long, default_value = "yl32")]
    value_column: String,

    /// Column holding the treatment group (optional in the file)
    #[arg(long, default_value = "group")]
    group_column: String,

    /// Column holding the post-treatment flag (optional in the file)
    #[arg(long, default_value = "post_antibiotic")]
    flag_column: String,
}

impl InputArgs {
    fn load_options(&self) -> Result<LoadOptions> {
        let delimiter = parse_delimiter(&self.delimiter).ok_or_else(|| {
            TimecourseError::InvalidParameter(format!("invalid delimiter '{}'", self.delimiter))
        })?;
        Ok(LoadOptions::default()
            .with_delimiter(delimiter)
            .with_columns(ColumnSchema {
                day: self.day_column.clone(),
                subject: self.subject_column.clone(),
                value: self.value_column.clone(),
                group: self.group_column.clone(),
                flag: self.flag_column.clone(),
            }))
    }

    fn load(&self) -> Result<MeasurementTable> {
        eprintln!("Loading {:?}...", self.input);
        let table = MeasurementTable::load(&self.input, &self.load_options()?)?;
        eprintln!(
            "Loaded {} measurements from {} subjects over {} days",
            table.len(),
            table.subjects().len(),
            table.days().len()
        );
        Ok(table)
    }
}

/// Longitudinal abundance timecourse analysis
#[derive(Parser)]
#[command(name = "timecourse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview a table with descriptive statistics and count tables
    Inspect {
        #[command(flatten)]
        input: InputArgs,

        /// Number of rows to preview
        #[arg(short = 'n', long, default_value = "5")]
        rows: usize,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write the table with its derived log10 column
    Log10 {
        #[command(flatten)]
        input: InputArgs,

        /// Output path for the transformed table
        #[arg(short, long)]
        output: PathBuf,

        /// Drop non-positive values instead of failing on them
        #[arg(long)]
        drop_nonpositive: bool,
    },

    /// Aggregate mean, median, std and count
    Summarize {
        #[command(flatten)]
        input: InputArgs,

        /// Grouping
        #[arg(short, long, value_enum, default_value = "day")]
        by: CliGroupBy,

        /// Summarize log10 values instead of raw values
        #[arg(long)]
        log10: bool,

        /// Drop non-positive values before the log10 transform
        #[arg(long)]
        drop_nonpositive: bool,

        /// Output path for a tab-separated summary table
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write plot-ready figure data as JSON
    Figure {
        #[command(flatten)]
        input: InputArgs,

        /// Figure to prepare
        #[arg(short, long, value_enum)]
        kind: CliFigure,

        /// Output path for the figure JSON
        #[arg(short, long)]
        output: PathBuf,

        /// Plot log10 values
        #[arg(long)]
        log10: bool,

        /// Categorical palette (okabe-ito, tol-bright, tol-muted, ibm)
        #[arg(long, default_value = "okabe-ito")]
        palette: String,

        /// Group drawn in neutral gray as the control
        #[arg(long)]
        control: Option<String>,

        /// Colormap for heatmaps
        #[arg(long, value_enum, default_value = "cividis")]
        colormap: CliColormap,

        /// Jitter seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Jitter half-width in days
        #[arg(long, default_value = "0.4")]
        jitter_range: f64,
    },

    /// List available palettes and colormaps
    Palettes,

    /// Run a pipeline from a YAML configuration file
    Run {
        /// Path to pipeline configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to the measurement table; read with the config's input section
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for pipeline outputs
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate an example pipeline configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "pipeline.yaml")]
        output: PathBuf,

        /// Preset to write
        #[arg(short, long, value_enum, default_value = "jittered-replicates")]
        preset: CliPreset,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Inspect {
            input,
            rows,
            format,
        } => cmd_inspect(&input, rows, &format),

        Commands::Log10 {
            input,
            output,
            drop_nonpositive,
        } => cmd_log10(&input, &output, drop_nonpositive),

        Commands::Summarize {
            input,
            by,
            log10,
            drop_nonpositive,
            output,
        } => cmd_summarize(&input, by.into(), log10, drop_nonpositive, output.as_ref()),

        Commands::Figure {
            input,
            kind,
            output,
            log10,
            palette,
            control,
            colormap,
            seed,
            jitter_range,
        } => cmd_figure(
            &input,
            kind,
            &output,
            log10,
            &palette,
            control.as_deref(),
            colormap.into(),
            JitterConfig {
                range: jitter_range,
                seed,
            },
        ),

        Commands::Palettes => cmd_palettes(),

        Commands::Run {
            config,
            input,
            output,
        } => cmd_run(&config, &input, &output),

        Commands::Example { output, preset } => cmd_example(&output, preset),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialise the global `tracing` subscriber on stderr.
fn setup_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).init();
}

/// Load, then optionally drop non-positive values, then optionally add log10.
fn prepare(input: &InputArgs, log10: bool, drop: bool) -> Result<MeasurementTable> {
    let mut table = input.load()?;
    if drop {
        let (kept, report) = drop_nonpositive(table.measurements());
        if report.n_dropped() > 0 {
            eprintln!("Dropped {} non-positive measurements", report.n_dropped());
        }
        table = table.with_measurements(kept);
    }
    if log10 {
        table = log10_table(&table)?;
    }
    Ok(table)
}

/// Preview and describe a table
fn cmd_inspect(input: &InputArgs, rows: usize, format: &str) -> Result<()> {
    let table = input.load()?;
    let descriptions = describe_table(&table);
    let per_subject = measurements_per_subject(table.measurements());
    let markers = post_treatment_days(table.measurements());

    match format {
        "json" => {
            let mut report = serde_json::json!({
                "source": table.source(),
                "n_measurements": table.len(),
                "subjects": table.subjects(),
                "days": table.days(),
                "describe": descriptions,
                "measurements_per_subject": per_subject,
                "post_treatment_days": markers,
            });
            if table.has_groups() {
                let replicates: Vec<serde_json::Value> =
                    replicates_per_group_day(table.measurements())?
                        .into_iter()
                        .map(|((group, day), n)| {
                            serde_json::json!({ "group": group, "day": day, "count": n })
                        })
                        .collect();
                report["groups"] = serde_json::json!(table.groups());
                report["measurements_per_group"] =
                    serde_json::json!(measurements_per_group(table.measurements())?);
                report["subjects_per_group"] =
                    serde_json::json!(subjects_per_group(table.measurements())?);
                report["replicates_per_group_day"] = serde_json::json!(replicates);
                report["post_treatment_days_by_group"] =
                    serde_json::json!(post_treatment_days_by_group(table.measurements()));
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!("First {} rows:", rows.min(table.len()));
            println!("{}", table.with_measurements(table.head(rows).to_vec()));

            for description in &descriptions {
                println!("{}", description);
            }

            println!("Measurements per subject:");
            for (subject, n) in &per_subject {
                println!("  {:<12} {}", subject, n);
            }

            if table.has_groups() {
                let measurements = measurements_per_group(table.measurements())?;
                let subjects = subjects_per_group(table.measurements())?;
                println!();
                println!("{:<16} {:>8} {:>12}", "Group", "Subjects", "Measurements");
                for (group, n) in &measurements {
                    println!(
                        "{:<16} {:>8} {:>12}",
                        group,
                        subjects.get(group).copied().unwrap_or(0),
                        n
                    );
                }
            }

            println!();
            if markers.is_empty() {
                println!("No post-treatment days flagged");
            } else {
                let days: Vec<String> = markers.iter().map(|d| d.to_string()).collect();
                println!("Post-treatment days: {}", days.join(", "));
            }
        }
    }

    Ok(())
}

/// Write the table with a log10 column
fn cmd_log10(input: &InputArgs, output: &PathBuf, drop: bool) -> Result<()> {
    let table = prepare(input, true, drop)?;
    let delimiter = input.load_options()?.delimiter;
    table.write_delimited(output, delimiter)?;
    eprintln!("Wrote {} rows to {:?}", table.len(), output);
    Ok(())
}

/// Print and optionally write grouped summaries
fn cmd_summarize(
    input: &InputArgs,
    by: GroupBy,
    log10: bool,
    drop: bool,
    output: Option<&PathBuf>,
) -> Result<()> {
    let table = prepare(input, log10, drop)?;
    let (field, label) = if log10 {
        (ValueField::Log10, table.columns().log10_column())
    } else {
        (ValueField::Raw, table.columns().value.clone())
    };

    let summaries = aggregate(table.measurements(), by, field)?;
    for summary in &summaries {
        println!("{}", summary);
    }

    if let Some(path) = output {
        write_summaries(path, &summaries, &label, b'\t')?;
        eprintln!("Wrote {} summary rows to {:?}", summaries.len(), path);
    }
    Ok(())
}

/// Write figure JSON
#[allow(clippy::too_many_arguments)]
fn cmd_figure(
    input: &InputArgs,
    kind: CliFigure,
    output: &PathBuf,
    log10: bool,
    palette: &str,
    control: Option<&str>,
    colormap: Colormap,
    jitter: JitterConfig,
) -> Result<()> {
    let palette: Palette = palette.parse().map_err(TimecourseError::InvalidParameter)?;
    let table = prepare(input, log10, false)?;
    let field = if log10 { ValueField::Log10 } else { ValueField::Raw };

    let figure = match kind {
        CliFigure::Trajectories => FigureData::trajectories(&table, field, palette)?,
        CliFigure::Jitter => FigureData::jittered_replicates(&table, field, &jitter)?,
        CliFigure::Facets => FigureData::facets(&table, field, palette)?,
        CliFigure::GroupMeans => FigureData::group_means(&table, field, palette, control)?,
        CliFigure::Heatmap => FigureData::heatmap(&table, field, colormap)?,
    };

    figure.write_json(output)?;
    eprintln!("Wrote {} to {:?}", figure.title, output);
    Ok(())
}

/// List palettes and colormaps
fn cmd_palettes() -> Result<()> {
    println!("Categorical palettes:");
    for palette in Palette::ALL {
        println!("  {:<12} {}", palette.name(), palette.colors().join(" "));
    }
    println!("  Control groups use {}", CONTROL_COLOR);
    println!();
    println!("Colormaps:");
    for map in [Colormap::Viridis, Colormap::Cividis, Colormap::Jet] {
        println!(
            "  {:<10} perceptually uniform: {:<5} CVD-optimized: {}",
            map.name(),
            map.is_perceptually_uniform(),
            map.is_cvd_optimized()
        );
    }
    Ok(())
}

/// Run a pipeline from configuration
fn cmd_run(config_path: &PathBuf, input_path: &PathBuf, output_dir: &PathBuf) -> Result<()> {
    eprintln!("Loading pipeline configuration from {:?}...", config_path);
    let config_str = std::fs::read_to_string(config_path)?;
    let config = PipelineConfig::from_yaml(&config_str)?;
    let pipeline = Pipeline::from_config(&config);

    eprintln!("Loading data...");
    let table = pipeline.load(input_path)?;
    eprintln!("Loaded {} measurements", table.len());

    eprintln!("Running pipeline '{}'...", config.name);
    let result = pipeline.run(&table)?;

    if let Some(report) = &result.dropped {
        eprintln!("  Dropped {} non-positive measurements", report.n_dropped());
    }
    for summary in &result.summaries {
        eprintln!(
            "  {:?} summary of {}: {} rows",
            summary.by,
            summary.field.name(),
            summary.rows.len()
        );
    }

    let written = result.write_outputs(output_dir)?;
    eprintln!("Done! Wrote {} files to {:?}", written.len(), output_dir);
    Ok(())
}

/// Write an example pipeline config
fn cmd_example(output_path: &PathBuf, preset: CliPreset) -> Result<()> {
    let (pipeline, description) = match preset {
        CliPreset::DailySummary => (
            Pipeline::daily_summary(),
            "Daily mean, median, std and count of raw abundance",
        ),
        CliPreset::JitteredReplicates => (
            Pipeline::jittered_replicates(),
            "Log10 daily summaries with jittered replicates and post-treatment markers",
        ),
        CliPreset::GroupMeans => (
            Pipeline::group_means(),
            "Log10 mean trajectories per treatment group",
        ),
    };

    let config = pipeline.to_config(Some(description));
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example pipeline to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
