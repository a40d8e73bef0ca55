//! Error taxonomy for the forecasting pipeline.
//!
//! Every stage reports failures through [`ForecastError`]. Each variant carries
//! enough context (file, directory, available columns, sample team names) to
//! diagnose the problem without re-running the tool.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("{file} not found in {}", .dir.display())]
    MissingSource { file: String, dir: PathBuf },

    #[error("Could not parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("Missing columns in {table}: {missing:?}\nAvailable columns: {available:?}")]
    MissingColumn {
        table: String,
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Team '{team}' not found in {table}\nAvailable teams in {table}: {sample:?}")]
    MissingTeam {
        team: String,
        table: String,
        sample: Vec<String>,
    },

    #[error("Team '{team}' appears more than once in {table}")]
    DuplicateTeam { team: String, table: String },

    #[error("No usable value for '{field}' for team '{team}'")]
    IncompleteTeam { team: String, field: String },

    #[error("Only {rows} usable games remain after cleaning; need at least {required} to fit the model")]
    InsufficientData { rows: usize, required: usize },

    #[error("Model fitting failed: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
