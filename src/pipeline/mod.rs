//! Pipeline composition and execution for timecourse analyses.

mod runner;

pub use runner::{
    AnalysisResult, AnalysisStep, InputConfig, JitterOutput, Pipeline, PipelineConfig,
    SummaryOutput,
};
