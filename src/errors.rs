//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError so that the CLI can
//! tell a booking conflict from a broken store or a malformed input.

use std::io;
use thiserror::Error;

/// Coarse classification used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Booking collision: pick another slot or other stations.
    Conflict,
    /// Store unreachable or failing: retryable.
    Transport,
    /// Malformed input: needs user correction.
    Validation,
    /// Referenced row does not exist.
    NotFound,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO / store
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing / validation
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid time range: {start} must be earlier than {end}")]
    InvalidRange { start: String, end: String },

    #[error("Invalid station type: {0}")]
    InvalidStationKind(String),

    #[error("Invalid booking status: {0}")]
    InvalidStatus(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    // ---------------------------
    // Booking / session logic
    // ---------------------------
    #[error("Stations not available for the requested slot: {}", .stations.join(", "))]
    Conflict { stations: Vec<String> },

    #[error("Booking group {0} already exists with different details")]
    DuplicateGroup(String),

    #[error("Unknown station: {0}")]
    UnknownStation(String),

    #[error("Station {0} is retired and cannot be used")]
    StationRetired(String),

    #[error("Station {station} already has an open session (#{session_id})")]
    StationOccupied { station: String, session_id: i64 },

    #[error("Booking #{0} not found")]
    BookingNotFound(i64),

    #[error("Booking group {0} not found")]
    GroupNotFound(String),

    #[error("Booking #{id} cannot be changed: status is {status}")]
    BookingLocked { id: i64, status: String },

    #[error("Session #{0} not found")]
    SessionNotFound(i64),

    #[error("Session #{0} is already closed")]
    SessionClosed(i64),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Conflict { .. } | AppError::StationOccupied { .. } => ErrorKind::Conflict,
            AppError::Io(_) | AppError::Db(_) | AppError::Migration(_) => ErrorKind::Transport,
            AppError::InvalidDate(_)
            | AppError::InvalidTime(_)
            | AppError::InvalidRange { .. }
            | AppError::InvalidStationKind(_)
            | AppError::InvalidStatus(_)
            | AppError::Validation(_)
            | AppError::DuplicateGroup(_)
            | AppError::StationRetired(_)
            | AppError::BookingLocked { .. }
            | AppError::SessionClosed(_) => ErrorKind::Validation,
            AppError::UnknownStation(_)
            | AppError::BookingNotFound(_)
            | AppError::GroupNotFound(_)
            | AppError::SessionNotFound(_) => ErrorKind::NotFound,
            AppError::Config(_) | AppError::ConfigLoad | AppError::ConfigSave | AppError::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Transport failures are the only ones worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_every_station() {
        let err = AppError::Conflict {
            stations: vec!["s1".into(), "pool-2".into()],
        };
        assert_eq!(
            err.to_string(),
            "Stations not available for the requested slot: s1, pool-2"
        );
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!err.is_retryable());
    }

    #[test]
    fn store_failures_are_retryable() {
        let err: AppError = rusqlite::Error::InvalidQuery.into();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_retryable());
    }
}
