//! Error types for the booking write path

use std::fmt;

use thiserror::Error;

use crate::db::{AcquireError, DbError};

pub type BookingResult<T> = Result<T, BookingError>;

/// Why a booking was not persisted
#[derive(Error, Debug)]
pub enum BookingError {
    /// Connection string missing. Fatal until configuration changes.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection could not be established (or timed out).
    #[error("connection error: {0}")]
    Connection(AcquireError),

    /// The store rejected or failed the insert.
    #[error("write error: {0}")]
    Write(#[from] DbError),
}

/// Failure category, for logging and analytics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingErrorKind {
    Configuration,
    Connection,
    Write,
}

impl BookingError {
    pub fn kind(&self) -> BookingErrorKind {
        match self {
            Self::Configuration(_) => BookingErrorKind::Configuration,
            Self::Connection(_) => BookingErrorKind::Connection,
            Self::Write(_) => BookingErrorKind::Write,
        }
    }
}

impl From<AcquireError> for BookingError {
    fn from(e: AcquireError) -> Self {
        match e {
            AcquireError::Configuration(msg) => Self::Configuration(msg),
            other => Self::Connection(other),
        }
    }
}

impl fmt::Display for BookingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Connection => "connection",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}
