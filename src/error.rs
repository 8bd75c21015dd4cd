//! Error types for the fallible edges of the dashboard.
//!
//! Command plumbing uses `anyhow`; these are the errors callers match on.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::FilterKind;

/// Loading the static application dataset failed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse application data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate application id: {0}")]
    DuplicateId(String),
}

/// Producing or writing an export artifact failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no data to export")]
    Empty,

    #[error("csv serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook serialization failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("too many columns for a worksheet: {0}")]
    TooManyColumns(usize),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The config file exists but could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A compact filter expression (`>5`, `2024-01-01..2024-02-01`, ...) did not parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterExprError {
    #[error("malformed filter expression: {0:?}")]
    Malformed(String),

    #[error("not a number: {0:?}")]
    NotANumber(String),

    #[error("not a date (expected YYYY-MM-DD): {0:?}")]
    NotADate(String),

    #[error("operator {op:?} is not supported for {kind} columns")]
    UnsupportedOperator { op: String, kind: FilterKind },
}
