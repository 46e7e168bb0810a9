use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the survey table.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("failed to open survey table {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("survey table is missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<&'static str> },

    #[error("invalid survey record at line {line}: {message}")]
    InvalidRecord { line: u64, message: String },

    #[error("failed to read survey table: {0}")]
    Csv(#[from] csv::Error),
}

/// Which end of a point table an anchor was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorEnd {
    Leading,
    Trailing,
}

impl std::fmt::Display for AnchorEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorEnd::Leading => f.write_str("first"),
            AnchorEnd::Trailing => f.write_str("last"),
        }
    }
}

/// Errors raised while rewriting a geometry document.
///
/// Line numbers are 1-based, as an editor shows them.
#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("line {line}: too short to hold the {end} station/elevation pair of the table")]
    AnchorTooShort { line: usize, end: AnchorEnd },

    #[error("line {line}: point table header has no table body after it")]
    MissingTableBody { line: usize },

    #[error("line {line}: #Mann= reached for a matched cross section before any #Sta/Elev= table")]
    TerminatorWithoutTable { line: usize },

    #[error("point table opened at line {header_line} is never closed by #Mann=")]
    UnterminatedTable { header_line: usize },

    #[error("value {value} does not fit in an 8 character field")]
    FieldOverflow { value: f64 },

    #[error("'{text}' is not a station/elevation pair")]
    InvalidPair { text: String },
}

/// Top level error for a rewrite run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("failed to read geometry file {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output directory {path} is the input directory; its geometry files would be overwritten")]
    OutputOverwritesInput { path: PathBuf },

    #[error("failed to write geometry file {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
