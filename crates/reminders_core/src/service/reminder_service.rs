//! Reminder and list use-case service.
//!
//! # Responsibility
//! - Expose list/reminder CRUD as async, result-typed calls.
//! - Gate operations on the negotiated authorization status.
//! - Translate store failures into the `ReminderError` taxonomy.
//!
//! # Invariants
//! - Reads under insufficient read permission return empty results.
//! - Mutations under insufficient write permission fail with
//!   `ReminderError::PermissionDenied`.
//! - Mutations hold the exclusive gate for their whole resolve-then-persist
//!   sequence; reads hold the shared gate.
//! - No operation prompts for permission or retries.

use crate::error::{ReminderError, ReminderResult};
use crate::model::authorization::OperationClass;
use crate::model::reminder::{ListDraft, Reminder, ReminderDraft, ReminderList};
use crate::permission::PermissionNegotiator;
use crate::store::{ItemFilter, ReminderStore};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// CRUD facade over one backing store handle.
pub struct RemindersService<S: ReminderStore> {
    store: Arc<S>,
    permissions: PermissionNegotiator<S>,
    gate: RwLock<()>,
}

impl<S: ReminderStore> RemindersService<S> {
    /// Creates a service over an injected store handle.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            permissions: PermissionNegotiator::new(Arc::clone(&store)),
            store,
            gate: RwLock::new(()),
        }
    }

    /// Permission negotiator bound to the same store handle.
    pub fn permissions(&self) -> &PermissionNegotiator<S> {
        &self.permissions
    }

    /// Returns the underlying store handle.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// All lists known to the store. Order is store-defined.
    pub async fn list_lists(&self) -> ReminderResult<Vec<ReminderList>> {
        if !self.readable("list_lists") {
            return Ok(Vec::new());
        }
        let _read = self.gate.read().await;
        let lists = self.store.enumerate_lists().await?;
        debug!(
            "event=list_lists module=service status=ok count={}",
            lists.len()
        );
        Ok(lists)
    }

    /// Id of the store's default list.
    pub async fn default_list_id(&self) -> ReminderResult<Option<String>> {
        Ok(self.default_list().await?.map(|list| list.id))
    }

    /// The store's default list.
    pub async fn default_list(&self) -> ReminderResult<Option<ReminderList>> {
        if !self.readable("default_list") {
            return Ok(None);
        }
        let _read = self.gate.read().await;
        Ok(self.store.default_list().await?)
    }

    /// Reminders in one list, or across every list when `list_id` is `None`.
    ///
    /// An unknown `list_id` yields an empty result.
    pub async fn list_reminders(&self, list_id: Option<&str>) -> ReminderResult<Vec<Reminder>> {
        if !self.readable("list_reminders") {
            return Ok(Vec::new());
        }
        let _read = self.gate.read().await;

        let filter = match list_id {
            Some(list_id) => {
                if self.store.resolve_list(list_id).await?.is_none() {
                    debug!("event=list_reminders module=service status=ok count=0 reason=unknown_list");
                    return Ok(Vec::new());
                }
                ItemFilter::in_list(list_id)
            }
            None => ItemFilter::all(),
        };

        let items = self.store.enumerate_items(&filter).await?;
        debug!(
            "event=list_reminders module=service status=ok count={}",
            items.len()
        );
        Ok(items)
    }

    /// Persists a new reminder and returns its store-assigned id.
    ///
    /// # Errors
    /// - `InvalidList` when `draft.list_id` does not resolve; nothing is saved.
    /// - `Store` when persistence fails.
    pub async fn create_reminder(&self, draft: &ReminderDraft) -> ReminderResult<String> {
        logged("reminder_create", self.try_create_reminder(draft), |id| {
            format!("reminder_id={id}")
        })
        .await
    }

    /// Overwrites every mutable field of an existing reminder.
    ///
    /// `None` optional fields in `updates` clear the stored value.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not resolve.
    /// - `InvalidList` when `updates.list_id` does not resolve.
    pub async fn update_reminder(&self, id: &str, updates: &ReminderDraft) -> ReminderResult<()> {
        logged("reminder_update", self.try_update_reminder(id, updates), |_| {
            format!("reminder_id={id}")
        })
        .await
    }

    /// Updates the reminder named by `id` when it exists, otherwise creates a
    /// new one. Returns the id of the saved reminder.
    ///
    /// # Errors
    /// - `InvalidList` when `draft.list_id` does not resolve; nothing is saved.
    pub async fn save_reminder(
        &self,
        id: Option<&str>,
        draft: &ReminderDraft,
    ) -> ReminderResult<String> {
        logged("reminder_save", self.try_save_reminder(id, draft), |id| {
            format!("reminder_id={id}")
        })
        .await
    }

    /// Removes a reminder and commits immediately.
    pub async fn delete_reminder(&self, id: &str) -> ReminderResult<()> {
        logged("reminder_delete", self.try_delete_reminder(id), |_| {
            format!("reminder_id={id}")
        })
        .await
    }

    /// Creates a list in the same source as the current default list.
    ///
    /// # Errors
    /// - `UnknownError` when no default list exists to infer a source from.
    pub async fn create_list(&self, title: &str) -> ReminderResult<String> {
        logged("list_create", self.try_create_list(title), |id| {
            format!("list_id={id}")
        })
        .await
    }

    /// Renames a list.
    pub async fn update_list(&self, id: &str, new_title: &str) -> ReminderResult<()> {
        logged("list_update", self.try_update_list(id, new_title), |_| {
            format!("list_id={id}")
        })
        .await
    }

    /// Deletes a list and every reminder in it.
    pub async fn delete_list(&self, id: &str) -> ReminderResult<()> {
        logged("list_delete", self.try_delete_list(id), |_| {
            format!("list_id={id}")
        })
        .await
    }

    async fn try_create_reminder(&self, draft: &ReminderDraft) -> ReminderResult<String> {
        self.ensure_writable()?;
        let _write = self.gate.write().await;
        self.ensure_list_exists(&draft.list_id).await?;
        let draft = normalize_draft(draft);
        Ok(self.store.persist(None, &draft).await?)
    }

    async fn try_update_reminder(&self, id: &str, updates: &ReminderDraft) -> ReminderResult<()> {
        self.ensure_writable()?;
        let _write = self.gate.write().await;
        if self.store.resolve_item(id).await?.is_none() {
            return Err(ReminderError::NotFound(id.to_string()));
        }
        self.ensure_list_exists(&updates.list_id).await?;
        let updates = normalize_draft(updates);
        self.store.persist(Some(id), &updates).await?;
        Ok(())
    }

    async fn try_save_reminder(
        &self,
        id: Option<&str>,
        draft: &ReminderDraft,
    ) -> ReminderResult<String> {
        self.ensure_writable()?;
        let _write = self.gate.write().await;
        self.ensure_list_exists(&draft.list_id).await?;
        let existing = match id {
            Some(id) => self.store.resolve_item(id).await?.map(|item| item.id),
            None => None,
        };
        let draft = normalize_draft(draft);
        Ok(self.store.persist(existing.as_deref(), &draft).await?)
    }

    async fn try_delete_reminder(&self, id: &str) -> ReminderResult<()> {
        self.ensure_writable()?;
        let _write = self.gate.write().await;
        let item = self
            .store
            .resolve_item(id)
            .await?
            .ok_or_else(|| ReminderError::NotFound(id.to_string()))?;
        self.store.remove(&item).await?;
        Ok(())
    }

    async fn try_create_list(&self, title: &str) -> ReminderResult<String> {
        self.ensure_writable()?;
        let _write = self.gate.write().await;
        let default_list = self
            .store
            .default_list()
            .await?
            .ok_or(ReminderError::UnknownError)?;
        let draft = ListDraft {
            title: title.trim().to_string(),
            source_id: default_list.source_id,
        };
        Ok(self.store.persist_list(None, &draft).await?)
    }

    async fn try_update_list(&self, id: &str, new_title: &str) -> ReminderResult<()> {
        self.ensure_writable()?;
        let _write = self.gate.write().await;
        let list = self.resolve_list_or_invalid(id).await?;
        let draft = ListDraft {
            title: new_title.trim().to_string(),
            source_id: list.source_id,
        };
        self.store.persist_list(Some(id), &draft).await?;
        Ok(())
    }

    async fn try_delete_list(&self, id: &str) -> ReminderResult<()> {
        self.ensure_writable()?;
        let _write = self.gate.write().await;
        let list = self.resolve_list_or_invalid(id).await?;
        self.store.remove_list(&list).await?;
        Ok(())
    }

    fn readable(&self, event: &str) -> bool {
        let status = self.permissions.current_status();
        if status.permits(OperationClass::Read) {
            return true;
        }
        debug!("event={event} module=service status=skipped reason=no_read_access permission={status}");
        false
    }

    fn ensure_writable(&self) -> ReminderResult<()> {
        let status = self.permissions.current_status();
        if status.permits(OperationClass::Write) {
            Ok(())
        } else {
            Err(ReminderError::PermissionDenied(status))
        }
    }

    async fn ensure_list_exists(&self, list_id: &str) -> ReminderResult<()> {
        self.resolve_list_or_invalid(list_id).await.map(|_| ())
    }

    async fn resolve_list_or_invalid(&self, list_id: &str) -> ReminderResult<ReminderList> {
        self.store
            .resolve_list(list_id)
            .await?
            .ok_or_else(|| ReminderError::InvalidList(list_id.to_string()))
    }
}

fn normalize_draft(draft: &ReminderDraft) -> ReminderDraft {
    ReminderDraft {
        title: draft.title.trim().to_string(),
        ..draft.clone()
    }
}

async fn logged<T>(
    event: &str,
    operation: impl Future<Output = ReminderResult<T>>,
    describe: impl FnOnce(&T) -> String,
) -> ReminderResult<T> {
    let started_at = Instant::now();
    let result = operation.await;
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(value) => info!(
            "event={event} module=service status=ok {} duration_ms={duration_ms}",
            describe(value)
        ),
        Err(err) => warn!(
            "event={event} module=service status=error duration_ms={duration_ms} error_code={} error={}",
            err.code(),
            err
        ),
    }
    result
}
