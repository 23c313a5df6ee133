//! Error types for the data-loader crate.
//!
//! Every failure while reading or indexing the rating log ends the run,
//! so these variants exist to say *why* it ended: which file, which line,
//! which value.

use thiserror::Error;

/// Errors that can occur while loading, indexing and splitting rating logs
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Row in the ratings file couldn't be parsed
    ///
    /// `line` is 1-based and counts the header row.
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The ratings file held a header but no rows
    #[error("No ratings found in {0}")]
    EmptyDataset(String),

    /// K-fold validation needs at least two folds and a fold in range
    #[error("Invalid fold request: fold {fold} of {folds}")]
    InvalidFoldCount { fold: usize, folds: usize },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
