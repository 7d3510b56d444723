//! Method-channel transport over the reminders service.
//!
//! # Responsibility
//! - Route `(method, arguments)` pairs to service operations.
//! - Convert JSON argument bags into typed drafts and results back
//!   into plain JSON values using the camelCase wire names.
//! - Map every `ReminderError` to a `{code, message}` reply.
//!
//! # Invariants
//! - Unknown method names yield `ChannelReply::NotImplemented`.
//! - A `null` argument bag is treated as an empty object.
//! - Optional reminder keys (`notes`, `dueDate`) are omitted when absent.
//! - Never panics.

use log::{debug, info};
use reminders_core::{
    DueDate, Reminder, ReminderDraft, ReminderError, ReminderList, ReminderResult, ReminderStore,
    RemindersService,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Result of one channel invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelReply {
    Success(Value),
    Error { code: String, message: String },
    NotImplemented,
}

impl ChannelReply {
    pub fn error_from(err: &ReminderError) -> Self {
        Self::Error {
            code: err.code().to_string(),
            message: err.message(),
        }
    }
}

/// Channel method names understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    GetPlatformVersion,
    GetPermissionStatus,
    RequestPermission,
    HasAccess,
    GetDefaultListId,
    GetDefaultList,
    GetLists,
    CreateList,
    UpdateList,
    DeleteList,
    GetRemindersForListId,
    GetReminders,
    CreateReminder,
    UpdateReminder,
    SaveReminder,
    DeleteReminder,
}

impl Method {
    fn parse(name: &str) -> Option<Self> {
        let method = match name {
            "getPlatformVersion" => Self::GetPlatformVersion,
            "getPermissionStatus" => Self::GetPermissionStatus,
            "requestPermission" | "requestPermissions" => Self::RequestPermission,
            "hasAccess" => Self::HasAccess,
            "getDefaultListId" => Self::GetDefaultListId,
            "getDefaultList" => Self::GetDefaultList,
            "getLists" | "getAllLists" => Self::GetLists,
            "createList" => Self::CreateList,
            "updateList" => Self::UpdateList,
            "deleteList" => Self::DeleteList,
            "getRemindersForListId" => Self::GetRemindersForListId,
            "getReminders" => Self::GetReminders,
            "createReminder" => Self::CreateReminder,
            "updateReminder" => Self::UpdateReminder,
            "saveReminder" => Self::SaveReminder,
            "deleteReminder" => Self::DeleteReminder,
            _ => return None,
        };
        Some(method)
    }
}

/// Whether `name` routes to a channel method.
pub fn supports_method(name: &str) -> bool {
    Method::parse(name).is_some()
}

/// Dispatches channel calls to one `RemindersService`.
pub struct MethodChannel<S: ReminderStore> {
    service: RemindersService<S>,
}

impl<S: ReminderStore> MethodChannel<S> {
    pub fn new(service: RemindersService<S>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &RemindersService<S> {
        &self.service
    }

    /// Handles one method call and resolves exactly once.
    pub async fn invoke(&self, method: &str, arguments: Value) -> ChannelReply {
        let Some(parsed) = Method::parse(method) else {
            debug!("event=channel_invoke module=ffi status=skipped reason=not_implemented method={method}");
            return ChannelReply::NotImplemented;
        };

        let result = match Arguments::from_value(arguments) {
            Ok(arguments) => self.dispatch(parsed, &arguments).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(value) => {
                debug!("event=channel_invoke module=ffi status=ok method={method}");
                ChannelReply::Success(value)
            }
            Err(err) => {
                info!(
                    "event=channel_invoke module=ffi status=error method={method} error_code={}",
                    err.code()
                );
                ChannelReply::error_from(&err)
            }
        }
    }

    async fn dispatch(&self, method: Method, arguments: &Arguments) -> ReminderResult<Value> {
        let service = &self.service;
        match method {
            Method::GetPlatformVersion => Ok(Value::String(platform_version())),
            Method::GetPermissionStatus => Ok(Value::String(
                service.permissions().current_status().as_str().to_string(),
            )),
            Method::RequestPermission => {
                let status = service.permissions().request_access().await;
                Ok(Value::Bool(status.is_sufficient()))
            }
            Method::HasAccess => Ok(Value::Bool(service.permissions().has_access())),
            Method::GetDefaultListId => Ok(service
                .default_list_id()
                .await?
                .map(Value::String)
                .unwrap_or(Value::Null)),
            Method::GetDefaultList => match service.default_list().await? {
                Some(list) => to_json(&ListPayload::from(&list)),
                None => Ok(Value::Null),
            },
            Method::GetLists => {
                let lists = service.list_lists().await?;
                to_json(&lists.iter().map(ListPayload::from).collect::<Vec<_>>())
            }
            Method::CreateList => {
                let title = arguments.required_str("title")?;
                Ok(Value::String(service.create_list(title).await?))
            }
            Method::UpdateList => {
                let id = arguments.required_str("id")?;
                let new_title = arguments.required_str("newTitle")?;
                service.update_list(id, new_title).await?;
                Ok(Value::Null)
            }
            Method::DeleteList => {
                service.delete_list(arguments.required_str("id")?).await?;
                Ok(Value::Null)
            }
            Method::GetRemindersForListId | Method::GetReminders => {
                let key = if method == Method::GetReminders { "id" } else { "listId" };
                let list_id = arguments.optional_str(key)?;
                let items = service.list_reminders(list_id).await?;
                to_json(&items.iter().map(ReminderPayload::from).collect::<Vec<_>>())
            }
            Method::CreateReminder => {
                let draft = parse_reminder(arguments.required("reminder")?)?;
                let id = service.create_reminder(&draft).await?;
                Ok(json!({
                    "success": true,
                    "message": "Reminder successfully created.",
                    "id": id
                }))
            }
            Method::UpdateReminder => {
                let id = arguments.required_str("id")?;
                let draft = parse_reminder(arguments.required("reminder")?)?;
                service.update_reminder(id, &draft).await?;
                Ok(json!({
                    "success": true,
                    "message": "Reminder successfully updated."
                }))
            }
            Method::SaveReminder => {
                let reminder = arguments.required("reminder")?;
                let draft = parse_reminder(reminder)?;
                let id = service.save_reminder(reminder_id(reminder)?, &draft).await?;
                Ok(Value::String(id))
            }
            Method::DeleteReminder => {
                service
                    .delete_reminder(arguments.required_str("id")?)
                    .await?;
                Ok(json!({ "success": true }))
            }
        }
    }
}

/// Platform identifier reported by `getPlatformVersion`.
pub fn platform_version() -> String {
    format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
}

struct Arguments(Map<String, Value>);

impl Arguments {
    fn from_value(value: Value) -> ReminderResult<Self> {
        match value {
            Value::Null => Ok(Self(Map::new())),
            Value::Object(map) => Ok(Self(map)),
            other => Err(ReminderError::Encoding(format!(
                "arguments must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn required(&self, key: &str) -> ReminderResult<&Value> {
        match self.0.get(key) {
            Some(Value::Null) | None => {
                Err(ReminderError::Encoding(format!("missing argument `{key}`")))
            }
            Some(value) => Ok(value),
        }
    }

    fn required_str(&self, key: &str) -> ReminderResult<&str> {
        let value = self.required(key)?;
        value.as_str().ok_or_else(|| {
            ReminderError::Encoding(format!(
                "argument `{key}` must be a string, got {}",
                json_kind(value)
            ))
        })
    }

    fn optional_str(&self, key: &str) -> ReminderResult<Option<&str>> {
        match self.0.get(key) {
            Some(Value::Null) | None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(ReminderError::Encoding(format!(
                "argument `{key}` must be a string or null, got {}",
                json_kind(other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Serialize)]
struct ListPayload<'a> {
    id: &'a str,
    title: &'a str,
}

impl<'a> From<&'a ReminderList> for ListPayload<'a> {
    fn from(list: &'a ReminderList) -> Self {
        Self {
            id: &list.id,
            title: &list.title,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReminderPayload<'a> {
    list_id: &'a str,
    id: &'a str,
    title: &'a str,
    priority: i64,
    is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<DueDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

impl<'a> From<&'a Reminder> for ReminderPayload<'a> {
    fn from(item: &'a Reminder) -> Self {
        Self {
            list_id: &item.list_id,
            id: &item.id,
            title: &item.title,
            priority: item.priority,
            is_completed: item.is_completed,
            due_date: item.due_date,
            notes: item.notes.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReminderInput {
    list_id: String,
    title: String,
    priority: i64,
    is_completed: bool,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    due_date: Option<DueDateInput>,
}

#[derive(Debug, Deserialize)]
struct DueDateInput {
    year: i64,
    month: i64,
    day: i64,
}

/// Decodes a reminder dictionary into a draft.
///
/// Shape errors map to `Encoding`; a well-shaped `dueDate` naming an
/// impossible date maps to `InvalidDateComponents`.
fn parse_reminder(value: &Value) -> ReminderResult<ReminderDraft> {
    let input = ReminderInput::deserialize(value)
        .map_err(|err| ReminderError::Encoding(format!("invalid reminder: {err}")))?;
    let due_date = input
        .due_date
        .map(|date| DueDate::from_components(date.year, date.month, date.day))
        .transpose()?;

    Ok(ReminderDraft {
        list_id: input.list_id,
        title: input.title,
        notes: input.notes,
        priority: input.priority,
        is_completed: input.is_completed,
        due_date,
    })
}

/// Reads the optional `id` of a reminder dictionary.
fn reminder_id(value: &Value) -> ReminderResult<Option<&str>> {
    match value.get("id") {
        Some(Value::Null) | None => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.as_str())),
        Some(other) => Err(ReminderError::Encoding(format!(
            "reminder `id` must be a string or null, got {}",
            json_kind(other)
        ))),
    }
}

fn to_json(value: &impl Serialize) -> ReminderResult<Value> {
    serde_json::to_value(value).map_err(|err| ReminderError::Encoding(err.to_string()))
}
