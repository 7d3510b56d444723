#![allow(dead_code)]

use async_trait::async_trait;
use reminders_core::{
    CapabilityModel, ItemFilter, ListDraft, RawAuthorization, Reminder, ReminderDraft,
    ReminderList, ReminderStore, StoreError, StoreResult,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted result of an access prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Grant,
    Deny,
    Fail,
}

#[derive(Default)]
struct FakeState {
    lists: Vec<ReminderList>,
    items: Vec<Reminder>,
    default_list_id: Option<String>,
    next_id: u64,
}

/// In-memory `ReminderStore` with a prompt counter and failure switches.
pub struct FakeStore {
    state: Mutex<FakeState>,
    authorization: Mutex<RawAuthorization>,
    model: CapabilityModel,
    prompt_outcome: PromptOutcome,
    prompt_delay: Duration,
    prompt_count: AtomicUsize,
    fail_writes: AtomicBool,
    write_delay: Duration,
    writes_in_flight: AtomicUsize,
    overlaps: AtomicUsize,
}

impl FakeStore {
    pub fn new(model: CapabilityModel, authorization: RawAuthorization) -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            authorization: Mutex::new(authorization),
            model,
            prompt_outcome: PromptOutcome::Grant,
            prompt_delay: Duration::ZERO,
            prompt_count: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            write_delay: Duration::ZERO,
            writes_in_flight: AtomicUsize::new(0),
            overlaps: AtomicUsize::new(0),
        }
    }

    /// Tiered store with full access and a default "Reminders" list.
    pub fn authorized() -> Self {
        let store = Self::new(CapabilityModel::Tiered, RawAuthorization::FullAccess);
        store.seed_default_list("Reminders", "local");
        store
    }

    pub fn with_prompt(mut self, outcome: PromptOutcome) -> Self {
        self.prompt_outcome = outcome;
        self
    }

    pub fn with_prompt_delay(mut self, delay: Duration) -> Self {
        self.prompt_delay = delay;
        self
    }

    /// Pauses inside every `persist`/`remove` for `delay`.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Reads or writes that started while another write was in progress.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    pub fn seed_list(&self, title: &str, source_id: &str) -> ReminderList {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let list = ReminderList {
            id: format!("list-{}", state.next_id),
            title: title.to_string(),
            source_id: source_id.to_string(),
        };
        state.lists.push(list.clone());
        list
    }

    pub fn seed_default_list(&self, title: &str, source_id: &str) -> ReminderList {
        let list = self.seed_list(title, source_id);
        self.state.lock().unwrap().default_list_id = Some(list.id.clone());
        list
    }

    pub fn set_authorization(&self, raw: RawAuthorization) {
        *self.authorization.lock().unwrap() = raw;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn prompt_count(&self) -> usize {
        self.prompt_count.load(Ordering::SeqCst)
    }

    pub fn item_count(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    async fn begin_write(&self) {
        if self.writes_in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
    }

    fn end_write(&self) {
        self.writes_in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn note_read(&self) {
        if self.writes_in_flight.load(Ordering::SeqCst) > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn apply_persist(&self, id: Option<&str>, draft: &ReminderDraft) -> StoreResult<String> {
        let mut state = self.state.lock().unwrap();
        match id {
            Some(id) => {
                let slot = state
                    .items
                    .iter_mut()
                    .find(|item| item.id == id)
                    .ok_or_else(|| StoreError::Conflict(format!("reminder {id} vanished")))?;
                *slot = Reminder::from_draft(id, draft.clone());
                Ok(id.to_string())
            }
            None => {
                state.next_id += 1;
                let id = format!("reminder-{}", state.next_id);
                state.items.push(Reminder::from_draft(id.clone(), draft.clone()));
                Ok(id)
            }
        }
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io("simulated write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReminderStore for FakeStore {
    async fn enumerate_lists(&self) -> StoreResult<Vec<ReminderList>> {
        self.note_read();
        Ok(self.state.lock().unwrap().lists.clone())
    }

    async fn resolve_list(&self, id: &str) -> StoreResult<Option<ReminderList>> {
        let state = self.state.lock().unwrap();
        Ok(state.lists.iter().find(|list| list.id == id).cloned())
    }

    async fn enumerate_items(&self, filter: &ItemFilter) -> StoreResult<Vec<Reminder>> {
        self.note_read();
        let state = self.state.lock().unwrap();
        Ok(state
            .items
            .iter()
            .filter(|item| match &filter.list_ids {
                Some(ids) => ids.contains(&item.list_id),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn resolve_item(&self, id: &str) -> StoreResult<Option<Reminder>> {
        self.note_read();
        let state = self.state.lock().unwrap();
        Ok(state.items.iter().find(|item| item.id == id).cloned())
    }

    async fn persist(&self, id: Option<&str>, draft: &ReminderDraft) -> StoreResult<String> {
        self.check_writable()?;
        self.begin_write().await;
        let result = self.apply_persist(id, draft);
        self.end_write();
        result
    }

    async fn remove(&self, item: &Reminder) -> StoreResult<()> {
        self.check_writable()?;
        self.begin_write().await;
        self.state
            .lock()
            .unwrap()
            .items
            .retain(|candidate| candidate.id != item.id);
        self.end_write();
        Ok(())
    }

    async fn persist_list(&self, id: Option<&str>, draft: &ListDraft) -> StoreResult<String> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        match id {
            Some(id) => {
                let slot = state
                    .lists
                    .iter_mut()
                    .find(|list| list.id == id)
                    .ok_or_else(|| StoreError::Conflict(format!("list {id} vanished")))?;
                slot.title = draft.title.clone();
                slot.source_id = draft.source_id.clone();
                Ok(id.to_string())
            }
            None => {
                state.next_id += 1;
                let id = format!("list-{}", state.next_id);
                state.lists.push(ReminderList {
                    id: id.clone(),
                    title: draft.title.clone(),
                    source_id: draft.source_id.clone(),
                });
                Ok(id)
            }
        }
    }

    async fn remove_list(&self, list: &ReminderList) -> StoreResult<()> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        state.lists.retain(|candidate| candidate.id != list.id);
        state.items.retain(|item| item.list_id != list.id);
        if state.default_list_id.as_deref() == Some(list.id.as_str()) {
            state.default_list_id = None;
        }
        Ok(())
    }

    async fn default_list(&self) -> StoreResult<Option<ReminderList>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .default_list_id
            .as_ref()
            .and_then(|id| state.lists.iter().find(|list| &list.id == id))
            .cloned())
    }

    fn current_authorization(&self) -> RawAuthorization {
        *self.authorization.lock().unwrap()
    }

    fn capability_model(&self) -> CapabilityModel {
        self.model
    }

    async fn request_authorization(&self) -> StoreResult<bool> {
        self.prompt_count.fetch_add(1, Ordering::SeqCst);
        if !self.prompt_delay.is_zero() {
            tokio::time::sleep(self.prompt_delay).await;
        }
        match self.prompt_outcome {
            PromptOutcome::Grant => {
                self.set_authorization(self.model.granted_level());
                Ok(true)
            }
            PromptOutcome::Deny => {
                self.set_authorization(RawAuthorization::Denied);
                Ok(false)
            }
            PromptOutcome::Fail => Err(StoreError::Io("prompt service unavailable".to_string())),
        }
    }
}
