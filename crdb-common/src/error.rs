//! Common error types for CRDB

use thiserror::Error;

/// Common result type for CRDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared by the data layer and the service
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Write would break a uniqueness rule (duplicate CRR name, etc.)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database file exists but was never seeded
    #[error("Database not initialized: {0}")]
    NotInitialized(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::race_time::RaceTimeError> for Error {
    fn from(err: crate::race_time::RaceTimeError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

impl From<crate::schedule_time::ScheduleTimeError> for Error {
    fn from(err: crate::schedule_time::ScheduleTimeError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

impl From<crate::season::SeasonError> for Error {
    fn from(err: crate::season::SeasonError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}
