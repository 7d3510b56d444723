//! Error taxonomy surfaced by the reminders service.
//!
//! # Responsibility
//! - Define the closed set of failures callers can branch on.
//! - Provide stable `code` strings for transport responses.
//!
//! # Invariants
//! - Codes never change between releases.
//! - Store failures keep their cause message verbatim.

use crate::db::DbError;
use crate::model::authorization::AuthorizationStatus;
use thiserror::Error;

pub type ReminderResult<T> = Result<T, ReminderError>;
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure raised by a backing store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Io(String),

    #[error("access to the reminders store was revoked")]
    PermissionRevoked,

    #[error("conflicting store mutation: {0}")]
    Conflict(String),

    #[error("invalid persisted store data: {0}")]
    InvalidData(String),

    #[error(
        "store connection schema version {actual_version} does not match expected {expected_version}"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Failure returned by every service operation.
#[derive(Debug, Error)]
pub enum ReminderError {
    /// Referenced list id does not resolve.
    #[error("invalid list id: {0}")]
    InvalidList(String),

    /// Referenced reminder id does not resolve.
    #[error("reminder not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed input shape at the transport boundary.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid date components")]
    InvalidDateComponents,

    /// Required context (e.g. a default list) is missing.
    #[error("unknown error")]
    UnknownError,

    /// Mutation attempted without sufficient write permission.
    #[error("permission denied: status is {0}")]
    PermissionDenied(AuthorizationStatus),
}

impl ReminderError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidList(_) => "INVALID_CALENDAR_ID",
            Self::NotFound(_) => "REMINDER_NOT_FOUND",
            Self::Store(_) => "EVENT_STORE_ERROR",
            Self::Encoding(_) => "ENCODING_ERROR",
            Self::InvalidDateComponents => "INVALID_DATE_COMPONENTS",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
        }
    }

    /// Caller-facing message paired with `code`.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidList(_) => "Invalid calendar ID.".to_string(),
            Self::NotFound(_) => "Reminder not found.".to_string(),
            Self::Store(err) => format!("Event store error: {err}"),
            Self::Encoding(detail) => format!("Encoding error: {detail}"),
            Self::InvalidDateComponents => "Invalid date components.".to_string(),
            Self::UnknownError => "An unknown error occurred.".to_string(),
            Self::PermissionDenied(status) => format!("Permission denied ({status})."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReminderError, StoreError};
    use crate::model::authorization::AuthorizationStatus;

    #[test]
    fn codes_are_stable() {
        let cases = [
            (ReminderError::InvalidList("x".into()), "INVALID_CALENDAR_ID"),
            (ReminderError::NotFound("x".into()), "REMINDER_NOT_FOUND"),
            (
                ReminderError::Store(StoreError::Io("disk".into())),
                "EVENT_STORE_ERROR",
            ),
            (ReminderError::Encoding("x".into()), "ENCODING_ERROR"),
            (ReminderError::InvalidDateComponents, "INVALID_DATE_COMPONENTS"),
            (ReminderError::UnknownError, "UNKNOWN_ERROR"),
            (
                ReminderError::PermissionDenied(AuthorizationStatus::Denied),
                "PERMISSION_DENIED",
            ),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn store_message_keeps_cause_verbatim() {
        let err = ReminderError::from(StoreError::Io("disk full (errno 28)".into()));
        assert_eq!(err.message(), "Event store error: disk full (errno 28)");
    }

    #[test]
    fn permission_message_names_status() {
        let err = ReminderError::PermissionDenied(AuthorizationStatus::WriteOnly);
        assert_eq!(err.message(), "Permission denied (writeOnly).");
    }
}
