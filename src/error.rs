//! Custom error types for the analysis core.
//!
//! This module defines `AnalysisError`, the single error type surfaced by every
//! fallible stage of the pipeline. Using the `thiserror` crate it keeps the fatal
//! conditions of the core (structurally broken input, an input that left no usable
//! rows, a zero scale factor) next to the ambient failures of the boundary helpers
//! (configuration loading, file I/O, CSV and JSON encoding).
//!
//! ## Error Hierarchy
//!
//! - **`Format`**: the raw text is structurally unusable (fewer than two lines, or a
//!   header with fewer than two columns). Fatal to the parse; no partial result.
//! - **`EmptyResult`**: the input was structurally valid but every data row was
//!   dropped during validation.
//! - **`InvalidScale`**: a zero (or non-finite) scale factor was requested. Raised
//!   before any aggregation runs.
//! - **`RssCollision`**: two complete axis groups derived the same RSS channel name
//!   while the collision policy is `Reject`.
//! - **`Configuration`** / **`Config`**: semantic validation failures and figment
//!   extraction failures respectively.
//! - **`Io`**, **`Csv`**, **`Serialization`**: export and report writing.
//!
//! Row-level defects (wrong field count, non-numeric cells) are *not*
//! represented here. They are absorbed by the parser and reported through
//! [`crate::data::parser::ParseReport`].

use thiserror::Error;

/// Convenience alias for results using the analysis error type.
pub type AppResult<T> = std::result::Result<T, AnalysisError>;

/// Primary error type for the vibration analysis core.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Structurally invalid input text.
    #[error("Format error: {0}")]
    Format(String),

    /// Zero rows survived row validation.
    #[error("No valid data rows found in CSV")]
    EmptyResult,

    /// Scale factor of zero or a non-finite value.
    #[error("Invalid scale factor {0}: factor must be finite and non-zero")]
    InvalidScale(f64),

    /// Two axis groups produced the same RSS channel name.
    #[error("RSS channel '{channel}' derived from both '{first}' and '{second}'")]
    RssCollision {
        /// Derived channel name both groups map to.
        channel: String,
        /// Base name of the group that claimed the channel first.
        first: String,
        /// Base name of the conflicting group.
        second: String,
    },

    /// Semantic configuration error (values parse but make no sense).
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Configuration could not be extracted from its sources.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader or writer failed below the row level.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding of the report payload failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Returns `true` for the errors the core raises on bad *input data*, as
    /// opposed to bad configuration or boundary I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(self, AnalysisError::Format(_) | AnalysisError::EmptyResult)
    }
}
