//! Error types for the abundance-timecourse library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum TimecourseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Input file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Schema error in {source_name}: {reason}")]
    Schema { source_name: String, reason: String },

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Empty group: no measurements for key {0}")]
    EmptyGroup(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A pipeline step failed; `source` keeps the step's own error kind.
    #[error("Pipeline error: step {step} ({name}) failed: {source}")]
    Pipeline {
        step: usize,
        name: String,
        source: Box<TimecourseError>,
    },

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TimecourseError {
    /// Schema error for a column that the caller asked for but the data lacks.
    pub fn missing_column(source_name: impl Into<String>, column: &str) -> Self {
        Self::Schema {
            source_name: source_name.into(),
            reason: format!("required column '{}' is absent", column),
        }
    }

    /// The innermost error, looking through pipeline step wrappers.
    pub fn root_cause(&self) -> &TimecourseError {
        match self {
            Self::Pipeline { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, TimecourseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = TimecourseError::MissingFile(PathBuf::from("data/yl32.csv"));
        assert_eq!(err.to_string(), "Input file not found: data/yl32.csv");

        let err = TimecourseError::missing_column("yl32.csv", "mouse");
        assert!(err.to_string().contains("'mouse'"));
        assert!(err.to_string().contains("yl32.csv"));
    }

    #[test]
    fn test_pipeline_root_cause() {
        let err = TimecourseError::Pipeline {
            step: 2,
            name: "Log10".to_string(),
            source: Box::new(TimecourseError::Domain("log10 undefined for value 0".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "Pipeline error: step 2 (Log10) failed: Domain error: log10 undefined for value 0"
        );
        assert!(matches!(err.root_cause(), TimecourseError::Domain(_)));
    }
}
