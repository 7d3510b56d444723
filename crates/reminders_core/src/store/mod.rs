//! Backing store capability contract.
//!
//! # Responsibility
//! - Define the thin interface the service layer depends on.
//! - Keep native/OS or SQLite details behind one trait seam.
//!
//! # Invariants
//! - `current_authorization` never prompts the user.
//! - Mutating calls report failures as `StoreError`; they never swallow them.
//! - Ids returned by `persist`/`persist_list` resolve immediately afterwards.

use crate::error::StoreResult;
use crate::model::authorization::{CapabilityModel, RawAuthorization};
use crate::model::reminder::{ListDraft, Reminder, ReminderDraft, ReminderList};
use async_trait::async_trait;

pub mod sqlite;

/// Predicate for item enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Restrict to these lists; `None` means every list.
    pub list_ids: Option<Vec<String>>,
}

impl ItemFilter {
    /// Matches items in every list.
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches items in exactly one list.
    pub fn in_list(list_id: impl Into<String>) -> Self {
        Self {
            list_ids: Some(vec![list_id.into()]),
        }
    }
}

/// Handle to a reminders system of record.
///
/// Every async method is a potential suspension point (native I/O or IPC).
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn enumerate_lists(&self) -> StoreResult<Vec<ReminderList>>;

    async fn resolve_list(&self, id: &str) -> StoreResult<Option<ReminderList>>;

    async fn enumerate_items(&self, filter: &ItemFilter) -> StoreResult<Vec<Reminder>>;

    async fn resolve_item(&self, id: &str) -> StoreResult<Option<Reminder>>;

    /// Inserts (`id == None`) or overwrites a reminder and returns its id.
    async fn persist(&self, id: Option<&str>, draft: &ReminderDraft) -> StoreResult<String>;

    async fn remove(&self, item: &Reminder) -> StoreResult<()>;

    /// Inserts (`id == None`) or overwrites a list and returns its id.
    async fn persist_list(&self, id: Option<&str>, draft: &ListDraft) -> StoreResult<String>;

    /// Removes a list together with its reminders.
    async fn remove_list(&self, list: &ReminderList) -> StoreResult<()>;

    async fn default_list(&self) -> StoreResult<Option<ReminderList>>;

    /// Raw authorization level; pure read.
    fn current_authorization(&self) -> RawAuthorization;

    fn capability_model(&self) -> CapabilityModel;

    /// Shows one access prompt and resolves to whether access was granted.
    async fn request_authorization(&self) -> StoreResult<bool>;
}
