use std::path::PathBuf;

use thiserror::Error;

/// Every failure a single dataset run can report.
///
/// `DataLoad`, `Write` and `Config` abort the run. `Render` is scoped to a
/// single chart and `EmptyNumericData` only disables the numeric charts; the
/// pipeline logs both and carries on.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to load dataset {}: {message}", .path.display())]
    DataLoad { path: PathBuf, message: String },

    #[error("dataset '{0}' has no numeric columns")]
    EmptyNumericData(String),

    #[error("failed to render {chart}: {message}")]
    Render { chart: String, message: String },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("environment variable {0} is required but not set")]
    MissingCredential(String),
}

impl AnalysisError {
    pub fn data_load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        AnalysisError::DataLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn render(chart: impl Into<String>, message: impl ToString) -> Self {
        AnalysisError::Render {
            chart: chart.into(),
            message: message.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
