//! Error types for table loading and configuration
//!
//! Loading failures are non-fatal: the session keeps its previous tables and
//! the message is shown to the user verbatim.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which reference table an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Crop,
    District,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Crop => write!(f, "crop table"),
            TableKind::District => write!(f, "district table"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DataFormatError {
    #[error("{table}: missing required column '{column}'")]
    MissingColumn { table: TableKind, column: String },

    #[error("{table}: no usable rows")]
    EmptyData { table: TableKind },

    #[error("{table}: row {row}, column '{column}': cannot parse '{value}' as a number or min-max range")]
    NumericParse {
        table: TableKind,
        column: String,
        row: usize,
        value: String,
    },

    #[error("{table}: malformed CSV: {message}")]
    Csv { table: TableKind, message: String },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DataFormatError {
    /// True for failures caused by the content of a table rather than by IO
    pub fn is_format_error(&self) -> bool {
        !matches!(self, DataFormatError::Io { .. })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
