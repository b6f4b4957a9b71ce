//! Error types for the calendar engine and the data service seam.

use thiserror::Error;

/// Errors raised by the date engine and the preset planner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Date arithmetic out of range: {0}")]
    DateOutOfRange(String),

    #[error("Preset length must be at least 1 day, got {0}")]
    InvalidPresetLength(i64),

    #[error("No cycle has been recorded yet")]
    NoActiveCycle,

    #[error("Start date is required")]
    MissingStart,

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Any failure surfaced by a data service call.
///
/// Cloneable so the view controller can keep the last failure around as
/// part of its state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Cycle not found: {0}")]
    CycleNotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Wraps an application-level error, keeping its full context chain.
    pub fn storage(err: anyhow::Error) -> Self {
        ServiceError::Storage(format!("{err:#}"))
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
