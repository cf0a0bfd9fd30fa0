use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning a file into a dataset
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported file format '{filename}'. Please use a CSV or Excel file (.csv, .xlsx, .xls)")]
    UnsupportedFormat { filename: String },

    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse {filename}: {reason}")]
    Parse { filename: String, reason: String },
}

/// Any failure reaching or running the external agent
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("ANTHROPIC_API_KEY is not set")]
    MissingCredential,

    #[error("request to the model provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected response from the model provider: {0}")]
    Malformed(String),

    #[error("agent stopped after {0} iterations without a final answer")]
    IterationLimit(usize),
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("column '{0}' does not exist in the dataset")]
    UnknownColumn(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("column '{column}' has a value that is not a date: '{value}'")]
    InvalidTemporal { column: String, value: String },

    #[error("no plottable rows for chart '{0}'")]
    Empty(String),

    #[error("failed to write chart: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
}
