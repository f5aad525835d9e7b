//! Error types for the dashboard core

use thiserror::Error;

/// Dashboard core error
#[derive(Debug, Error)]
pub enum Error {
    /// Unrecognized date-range preset identifier
    #[error("Invalid date range preset: {0}")]
    InvalidPreset(String),

    /// Date range that cannot be resolved or navigated
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// Lender payload failed validation
    #[error("Invalid lender: {0}")]
    InvalidLender(String),

    /// Value could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
