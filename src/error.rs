use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the optimum DCA engine
#[derive(Debug, Error)]
pub enum DcaError {
    /// An anchor date had no observation and strict gap handling was requested
    #[error("No price observation on anchor date {0}")]
    DataGap(NaiveDate),

    /// A caller needed more history than the input provides
    #[error("Insufficient history: need {needed}, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    /// Internal accounting invariant broken (e.g. negative holdings)
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed input rows
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
