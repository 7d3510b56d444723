//! Reminder list and reminder item value objects.
//!
//! # Responsibility
//! - Define snapshots the service hands out and drafts it accepts.
//! - Validate due-date components at construction.
//!
//! # Invariants
//! - `Reminder::id` is store-assigned; drafts never carry an id.
//! - `DueDate` always names a real calendar date.

use crate::error::{ReminderError, ReminderResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Priority value meaning "no priority".
pub const PRIORITY_NONE: i64 = 0;

/// Reminder container (a "calendar" in OS terms).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderList {
    pub id: String,
    pub title: String,
    /// Account/provider the list belongs to.
    pub source_id: String,
}

/// Payload for creating or renaming a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDraft {
    pub title: String,
    pub source_id: String,
}

/// Date-only due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "DueDateParts", into = "DueDateParts")]
pub struct DueDate {
    year: i32,
    month: u32,
    day: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct DueDateParts {
    year: i32,
    month: u32,
    day: u32,
}

impl DueDate {
    /// Builds a due date from calendar components.
    ///
    /// # Errors
    /// - `ReminderError::InvalidDateComponents` when the components do not
    ///   form a real date (e.g. month 13, February 30).
    pub fn new(year: i32, month: u32, day: u32) -> ReminderResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(|_| Self { year, month, day })
            .ok_or(ReminderError::InvalidDateComponents)
    }

    /// Builds a due date from loosely-typed integer components.
    pub fn from_components(year: i64, month: i64, day: i64) -> ReminderResult<Self> {
        let year = i32::try_from(year).map_err(|_| ReminderError::InvalidDateComponents)?;
        let month = u32::try_from(month).map_err(|_| ReminderError::InvalidDateComponents)?;
        let day = u32::try_from(day).map_err(|_| ReminderError::InvalidDateComponents)?;
        Self::new(year, month, day)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }
}

impl TryFrom<DueDateParts> for DueDate {
    type Error = String;

    fn try_from(value: DueDateParts) -> Result<Self, Self::Error> {
        Self::new(value.year, value.month, value.day).map_err(|err| err.to_string())
    }
}

impl From<DueDate> for DueDateParts {
    fn from(value: DueDate) -> Self {
        Self {
            year: value.year,
            month: value.month,
            day: value.day,
        }
    }
}

/// Reminder fields without store identity.
///
/// Used as the create payload and as the full-overwrite update payload:
/// `None` optional fields clear the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDraft {
    pub list_id: String,
    pub title: String,
    pub notes: Option<String>,
    pub priority: i64,
    pub is_completed: bool,
    pub due_date: Option<DueDate>,
}

impl ReminderDraft {
    /// Creates an incomplete, unprioritized draft in `list_id`.
    pub fn new(list_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            title: title.into(),
            notes: None,
            priority: PRIORITY_NONE,
            is_completed: false,
            due_date: None,
        }
    }
}

/// Persisted reminder snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub list_id: String,
    pub title: String,
    pub notes: Option<String>,
    pub priority: i64,
    pub is_completed: bool,
    pub due_date: Option<DueDate>,
}

impl Reminder {
    /// Combines a store-assigned id with draft fields.
    pub fn from_draft(id: impl Into<String>, draft: ReminderDraft) -> Self {
        Self {
            id: id.into(),
            list_id: draft.list_id,
            title: draft.title,
            notes: draft.notes,
            priority: draft.priority,
            is_completed: draft.is_completed,
            due_date: draft.due_date,
        }
    }

    /// Returns the mutable fields of this snapshot.
    pub fn to_draft(&self) -> ReminderDraft {
        ReminderDraft {
            list_id: self.list_id.clone(),
            title: self.title.clone(),
            notes: self.notes.clone(),
            priority: self.priority,
            is_completed: self.is_completed,
            due_date: self.due_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DueDate, Reminder, ReminderDraft};
    use crate::error::ReminderError;

    #[test]
    fn due_date_rejects_impossible_components() {
        assert!(matches!(
            DueDate::new(2024, 2, 30),
            Err(ReminderError::InvalidDateComponents)
        ));
        assert!(matches!(
            DueDate::new(2024, 13, 1),
            Err(ReminderError::InvalidDateComponents)
        ));
        assert!(matches!(
            DueDate::from_components(2024, -1, 1),
            Err(ReminderError::InvalidDateComponents)
        ));
    }

    #[test]
    fn due_date_accepts_leap_day() {
        let date = DueDate::new(2024, 2, 29).unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 2, 29));
    }

    #[test]
    fn due_date_deserialization_validates() {
        let err = serde_json::from_str::<DueDate>(r#"{"year":2023,"month":2,"day":29}"#);
        assert!(err.is_err());

        let ok: DueDate = serde_json::from_str(r#"{"year":2023,"month":3,"day":1}"#).unwrap();
        assert_eq!(ok, DueDate::new(2023, 3, 1).unwrap());
    }

    #[test]
    fn draft_defaults_to_open_and_unprioritized() {
        let draft = ReminderDraft::new("list-1", "Milk");
        assert_eq!(draft.priority, 0);
        assert!(!draft.is_completed);
        assert!(draft.notes.is_none());
        assert!(draft.due_date.is_none());
    }

    #[test]
    fn snapshot_draft_conversion_keeps_fields() {
        let mut draft = ReminderDraft::new("list-1", "Milk");
        draft.notes = Some("2 litres".to_string());
        draft.due_date = Some(DueDate::new(2025, 1, 5).unwrap());

        let reminder = Reminder::from_draft("r-1", draft.clone());
        assert_eq!(reminder.id, "r-1");
        assert_eq!(reminder.to_draft(), draft);
    }
}
