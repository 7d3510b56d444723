//! Portable SQLite implementation of `ReminderStore`.
//!
//! # Responsibility
//! - Persist sources, lists and reminders in the canonical schema.
//! - Track the default-list designation and a persisted authorization level.
//! - Stand in for the native OS store on hosts without one.
//!
//! # Invariants
//! - The wrapped connection has migrations applied (checked by `try_new`).
//! - Removing the default list clears the designation in the same transaction.
//! - Overwrites of rows that no longer exist fail with `StoreError::Conflict`.
//!
//! # Concurrency
//! - Calls run synchronous rusqlite I/O on the calling task behind one
//!   `std::sync::Mutex`; hosts on a multi-threaded runtime should keep the
//!   database local and small, or move calls onto `spawn_blocking`.

use crate::db::migrations::latest_version;
use crate::error::{StoreError, StoreResult};
use crate::model::authorization::{CapabilityModel, RawAuthorization};
use crate::model::reminder::{DueDate, ListDraft, Reminder, ReminderDraft, ReminderList};
use crate::store::{ItemFilter, ReminderStore};
use async_trait::async_trait;
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const META_DEFAULT_LIST_ID: &str = "default_list_id";
const META_AUTHORIZATION: &str = "authorization";

const REMINDER_SELECT_SQL: &str = "SELECT
    id,
    list_id,
    title,
    notes,
    priority,
    is_completed,
    due_year,
    due_month,
    due_day
FROM reminders";

/// Outcome the portable store reports when asked to prompt for access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPolicy {
    Grant,
    Deny,
}

impl PromptPolicy {
    /// Parses `grant|deny` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grant" => Some(Self::Grant),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

/// SQLite-backed reminders store.
pub struct SqliteReminderStore {
    conn: Mutex<Connection>,
    capability_model: CapabilityModel,
    prompt_policy: PromptPolicy,
    authorization: Mutex<RawAuthorization>,
    prompt_count: AtomicUsize,
}

impl SqliteReminderStore {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `StoreError::UninitializedConnection` when migrations were not applied.
    /// - `StoreError::InvalidData` when the persisted authorization is corrupt.
    pub fn try_new(
        conn: Connection,
        capability_model: CapabilityModel,
        prompt_policy: PromptPolicy,
    ) -> StoreResult<Self> {
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let authorization = match read_meta(&conn, META_AUTHORIZATION)? {
            Some(value) => RawAuthorization::from_db_str(&value).ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "invalid authorization value `{value}` in store_meta"
                ))
            })?,
            None => RawAuthorization::NotDetermined,
        };

        Ok(Self {
            conn: Mutex::new(conn),
            capability_model,
            prompt_policy,
            authorization: Mutex::new(authorization),
            prompt_count: AtomicUsize::new(0),
        })
    }

    /// Ensures a default list exists, creating a source and list when needed.
    ///
    /// Idempotent: returns the current default list when one is designated.
    pub fn bootstrap_default_list(
        &self,
        source_title: &str,
        list_title: &str,
    ) -> StoreResult<ReminderList> {
        let mut conn = self.lock_conn()?;
        if let Some(existing) = query_default_list(&conn)? {
            return Ok(existing);
        }

        let tx = conn.transaction()?;
        let source_id = Uuid::new_v4().to_string();
        let list = ReminderList {
            id: Uuid::new_v4().to_string(),
            title: list_title.to_string(),
            source_id: source_id.clone(),
        };
        tx.execute(
            "INSERT INTO sources (id, title) VALUES (?1, ?2);",
            params![source_id, source_title],
        )?;
        tx.execute(
            "INSERT INTO lists (id, title, source_id) VALUES (?1, ?2, ?3);",
            params![list.id, list.title, list.source_id],
        )?;
        write_meta(&tx, META_DEFAULT_LIST_ID, &list.id)?;
        tx.commit()?;

        info!(
            "event=store_bootstrap module=store status=ok list_id={} source_id={}",
            list.id, list.source_id
        );
        Ok(list)
    }

    /// Designates an existing list as default.
    pub fn set_default_list(&self, list_id: &str) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        if query_list(&conn, list_id)?.is_none() {
            return Err(StoreError::Conflict(format!("list {list_id} does not exist")));
        }
        write_meta(&conn, META_DEFAULT_LIST_ID, list_id)
    }

    /// Overwrites the persisted authorization level.
    pub fn set_authorization(&self, raw: RawAuthorization) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        write_meta(&conn, META_AUTHORIZATION, &raw.as_db_str())?;
        *self.lock_authorization() = raw;
        Ok(())
    }

    /// Number of access prompts shown by this handle.
    pub fn prompt_count(&self) -> usize {
        self.prompt_count.load(Ordering::SeqCst)
    }

    fn lock_conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Io("store connection lock poisoned".to_string()))
    }

    fn lock_authorization(&self) -> MutexGuard<'_, RawAuthorization> {
        // The guarded value is `Copy`; a poisoned lock still holds a valid level.
        self.authorization
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ReminderStore for SqliteReminderStore {
    async fn enumerate_lists(&self) -> StoreResult<Vec<ReminderList>> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, title, source_id FROM lists ORDER BY created_at, id;")?;
        let mut rows = stmt.query([])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(row)?);
        }
        Ok(lists)
    }

    async fn resolve_list(&self, id: &str) -> StoreResult<Option<ReminderList>> {
        let conn = self.lock_conn()?;
        query_list(&conn, id)
    }

    async fn enumerate_items(&self, filter: &ItemFilter) -> StoreResult<Vec<Reminder>> {
        let mut sql = format!("{REMINDER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(list_ids) = &filter.list_ids {
            if list_ids.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = vec!["?"; list_ids.len()].join(", ");
            sql.push_str(&format!(" AND list_id IN ({placeholders})"));
            bind_values.extend(list_ids.iter().cloned().map(Value::Text));
        }
        sql.push_str(" ORDER BY created_at, id");

        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_reminder_row(row)?);
        }
        Ok(items)
    }

    async fn resolve_item(&self, id: &str) -> StoreResult<Option<Reminder>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!("{REMINDER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_reminder_row(row)?)),
            None => Ok(None),
        }
    }

    async fn persist(&self, id: Option<&str>, draft: &ReminderDraft) -> StoreResult<String> {
        let conn = self.lock_conn()?;
        let (due_year, due_month, due_day) = split_due_date(draft.due_date);

        let Some(id) = id else {
            let new_id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO reminders (
                    id,
                    list_id,
                    title,
                    notes,
                    priority,
                    is_completed,
                    due_year,
                    due_month,
                    due_day
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    new_id,
                    draft.list_id,
                    draft.title,
                    draft.notes,
                    draft.priority,
                    bool_to_int(draft.is_completed),
                    due_year,
                    due_month,
                    due_day,
                ],
            )?;
            return Ok(new_id);
        };

        let changed = conn.execute(
            "UPDATE reminders
             SET
                list_id = ?1,
                title = ?2,
                notes = ?3,
                priority = ?4,
                is_completed = ?5,
                due_year = ?6,
                due_month = ?7,
                due_day = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?9;",
            params![
                draft.list_id,
                draft.title,
                draft.notes,
                draft.priority,
                bool_to_int(draft.is_completed),
                due_year,
                due_month,
                due_day,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::Conflict(format!("reminder {id} no longer exists")));
        }
        Ok(id.to_string())
    }

    async fn remove(&self, item: &Reminder) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        let changed = conn.execute("DELETE FROM reminders WHERE id = ?1;", [&item.id])?;
        if changed == 0 {
            return Err(StoreError::Conflict(format!(
                "reminder {} no longer exists",
                item.id
            )));
        }
        Ok(())
    }

    async fn persist_list(&self, id: Option<&str>, draft: &ListDraft) -> StoreResult<String> {
        let conn = self.lock_conn()?;

        let Some(id) = id else {
            let new_id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO lists (id, title, source_id) VALUES (?1, ?2, ?3);",
                params![new_id, draft.title, draft.source_id],
            )?;
            return Ok(new_id);
        };

        let changed = conn.execute(
            "UPDATE lists SET title = ?1, source_id = ?2 WHERE id = ?3;",
            params![draft.title, draft.source_id, id],
        )?;
        if changed == 0 {
            return Err(StoreError::Conflict(format!("list {id} no longer exists")));
        }
        Ok(id.to_string())
    }

    async fn remove_list(&self, list: &ReminderList) -> StoreResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let changed = tx.execute("DELETE FROM lists WHERE id = ?1;", [&list.id])?;
        if changed == 0 {
            return Err(StoreError::Conflict(format!(
                "list {} no longer exists",
                list.id
            )));
        }
        tx.execute(
            "DELETE FROM store_meta WHERE key = ?1 AND value = ?2;",
            params![META_DEFAULT_LIST_ID, list.id],
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn default_list(&self) -> StoreResult<Option<ReminderList>> {
        let conn = self.lock_conn()?;
        query_default_list(&conn)
    }

    fn current_authorization(&self) -> RawAuthorization {
        *self.lock_authorization()
    }

    fn capability_model(&self) -> CapabilityModel {
        self.capability_model
    }

    async fn request_authorization(&self) -> StoreResult<bool> {
        let prompt_number = self.prompt_count.fetch_add(1, Ordering::SeqCst) + 1;
        let (granted, level) = match self.prompt_policy {
            PromptPolicy::Grant => (true, self.capability_model.granted_level()),
            PromptPolicy::Deny => (false, RawAuthorization::Denied),
        };

        if let Err(err) = self.set_authorization(level) {
            warn!(
                "event=store_prompt module=store status=error prompt_number={} error={}",
                prompt_number, err
            );
            return Err(err);
        }
        info!(
            "event=store_prompt module=store status=ok prompt_number={} granted={}",
            prompt_number, granted
        );
        Ok(granted)
    }
}

fn query_list(conn: &Connection, id: &str) -> StoreResult<Option<ReminderList>> {
    let mut stmt = conn.prepare("SELECT id, title, source_id FROM lists WHERE id = ?1;")?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_list_row(row)?)),
        None => Ok(None),
    }
}

fn query_default_list(conn: &Connection) -> StoreResult<Option<ReminderList>> {
    match read_meta(conn, META_DEFAULT_LIST_ID)? {
        Some(list_id) => query_list(conn, &list_id),
        None => Ok(None),
    }
}

fn read_meta(conn: &Connection, key: &str) -> StoreResult<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM store_meta WHERE key = ?1;", [key], |row| {
            row.get::<_, String>(0)
        })
        .optional()?;
    Ok(value)
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO store_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        params![key, value],
    )?;
    Ok(())
}

fn parse_list_row(row: &Row<'_>) -> StoreResult<ReminderList> {
    Ok(ReminderList {
        id: row.get("id")?,
        title: row.get("title")?,
        source_id: row.get("source_id")?,
    })
}

fn parse_reminder_row(row: &Row<'_>) -> StoreResult<Reminder> {
    let id: String = row.get("id")?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_completed value `{other}` in reminders.is_completed"
            )));
        }
    };

    let due_date = match (
        row.get::<_, Option<i64>>("due_year")?,
        row.get::<_, Option<i64>>("due_month")?,
        row.get::<_, Option<i64>>("due_day")?,
    ) {
        (Some(year), Some(month), Some(day)) => Some(
            DueDate::from_components(year, month, day).map_err(|_| {
                StoreError::InvalidData(format!(
                    "invalid due date {year}-{month}-{day} for reminder {id}"
                ))
            })?,
        ),
        (None, None, None) => None,
        _ => {
            return Err(StoreError::InvalidData(format!(
                "partial due date for reminder {id}"
            )));
        }
    };

    Ok(Reminder {
        list_id: row.get("list_id")?,
        title: row.get("title")?,
        notes: row.get("notes")?,
        priority: row.get("priority")?,
        is_completed,
        due_date,
        id,
    })
}

fn split_due_date(due_date: Option<DueDate>) -> (Option<i64>, Option<i64>, Option<i64>) {
    match due_date {
        Some(date) => (
            Some(i64::from(date.year())),
            Some(i64::from(date.month())),
            Some(i64::from(date.day())),
        ),
        None => (None, None, None),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
