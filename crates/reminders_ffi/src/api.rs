//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the reminders method channel to Dart via FRB.
//! - Own the process-wide bridge instance backed by the portable store.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - The bridge is opened at most once per process; later `init_bridge`
//!   calls with a different database path are rejected.
//! - `invoke` opens the bridge with resolved defaults when `init_bridge`
//!   was never called.

use crate::channel::{supports_method, ChannelReply, MethodChannel};
use crate::config::BridgeConfig;
use log::{error, info};
use once_cell::sync::OnceCell;
use reminders_core::db::open_db;
use reminders_core::{
    core_version as core_version_inner, default_log_level, init_logging as init_logging_inner,
    ping as ping_inner, ReminderError, ReminderResult, RemindersService, SqliteReminderStore, StoreError,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

static BRIDGE: OnceCell<Bridge> = OnceCell::new();

struct Bridge {
    config: BridgeConfig,
    channel: MethodChannel<SqliteReminderStore>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive); blank
///   selects the build default (`debug` in debug builds, `info` otherwise).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = if level.trim().is_empty() {
        default_log_level()
    } else {
        level.as_str()
    };
    match init_logging_inner(level, log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens the reminders bridge over a portable store file.
///
/// `db_path` overrides `REMINDERS_DB_PATH`; when both are absent a file in
/// the system temp directory is used.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Idempotent for the same resolved database path.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_bridge(db_path: Option<String>) -> String {
    let config = BridgeConfig::resolve(db_path.as_deref());
    match BRIDGE.get_or_try_init(|| open_bridge(config.clone())) {
        Ok(bridge) if bridge.config.db_path == config.db_path => String::new(),
        Ok(bridge) => format!(
            "bridge already initialized with `{}`; refusing to switch to `{}`",
            bridge.config.db_path.display(),
            config.db_path.display()
        ),
        Err(err) => err.message(),
    }
}

/// Flat channel reply envelope for Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelResponse {
    /// Whether the call succeeded.
    pub ok: bool,
    /// JSON-encoded success value (`"null"` for void results).
    pub value_json: Option<String>,
    /// Stable error code on failure.
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    /// Set when the method name is not recognized.
    pub not_implemented: bool,
}

impl From<ChannelReply> for ChannelResponse {
    fn from(reply: ChannelReply) -> Self {
        match reply {
            ChannelReply::Success(value) => Self {
                ok: true,
                value_json: Some(value.to_string()),
                error_code: None,
                error_message: None,
                not_implemented: false,
            },
            ChannelReply::Error { code, message } => Self {
                ok: false,
                value_json: None,
                error_code: Some(code),
                error_message: Some(message),
                not_implemented: false,
            },
            ChannelReply::NotImplemented => Self {
                ok: false,
                value_json: None,
                error_code: None,
                error_message: None,
                not_implemented: true,
            },
        }
    }
}

/// Invokes one channel method.
///
/// `arguments_json` is a JSON object; an empty string means no arguments.
/// Unknown method names reply `not_implemented` without reading the
/// arguments or opening the bridge.
///
/// # FFI contract
/// - Async call; resolves exactly once.
/// - Never panics.
pub async fn invoke(method: String, arguments_json: String) -> ChannelResponse {
    if !supports_method(&method) {
        return ChannelReply::NotImplemented.into();
    }
    let arguments = match parse_arguments(&arguments_json) {
        Ok(arguments) => arguments,
        Err(err) => return ChannelReply::error_from(&err).into(),
    };
    let bridge = match BRIDGE.get_or_try_init(|| open_bridge(BridgeConfig::resolve(None))) {
        Ok(bridge) => bridge,
        Err(err) => return ChannelReply::error_from(&err).into(),
    };
    bridge.channel.invoke(&method, arguments).await.into()
}

fn parse_arguments(raw: &str) -> ReminderResult<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw)
        .map_err(|err| ReminderError::Encoding(format!("invalid arguments json: {err}")))
}

fn open_bridge(config: BridgeConfig) -> ReminderResult<Bridge> {
    let started_at = Instant::now();
    let result = build_channel(&config);
    match &result {
        Ok(_) => info!(
            "event=bridge_open module=ffi status=ok db_path={} capability_model={:?} prompt_policy={:?} duration_ms={}",
            config.db_path.display(),
            config.capability_model,
            config.prompt_policy,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=bridge_open module=ffi status=error db_path={} duration_ms={} error_code={} error={}",
            config.db_path.display(),
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
    result.map(|channel| Bridge { config, channel })
}

fn build_channel(config: &BridgeConfig) -> ReminderResult<MethodChannel<SqliteReminderStore>> {
    let conn = open_db(&config.db_path).map_err(StoreError::from)?;
    let store =
        SqliteReminderStore::try_new(conn, config.capability_model, config.prompt_policy)?;
    store.bootstrap_default_list(&config.source_title, &config.default_list_title)?;
    Ok(MethodChannel::new(RemindersService::new(Arc::new(store))))
}

#[cfg(test)]
mod tests {
    use super::{core_version, init_bridge, init_logging, invoke, parse_arguments, ping};
    use serde_json::{json, Value};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_blank_level_falls_back_to_default() {
        let error = init_logging("  ".to_string(), "relative/logs".to_string());
        assert!(error.contains("absolute path"), "{error}");
    }

    #[tokio::test]
    async fn unknown_method_is_not_implemented_before_arguments_are_read() {
        let reply = invoke("launchRockets".to_string(), "{oops".to_string()).await;
        assert!(reply.not_implemented);
        assert!(!reply.ok);
        assert_eq!(reply.error_code, None);
    }

    #[test]
    fn parse_arguments_accepts_blank_and_rejects_garbage() {
        assert_eq!(parse_arguments("  ").unwrap(), Value::Null);
        assert_eq!(parse_arguments(r#"{"id":"x"}"#).unwrap(), json!({"id": "x"}));
        assert_eq!(parse_arguments("{oops").unwrap_err().code(), "ENCODING_ERROR");
    }

    // The only test that touches the process-wide bridge.
    #[tokio::test]
    async fn bridge_round_trip_through_invoke() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.sqlite3");
        let path = path.to_str().unwrap().to_string();

        assert_eq!(init_bridge(Some(path.clone())), "");
        assert_eq!(init_bridge(Some(path.clone())), "");
        let other = dir.path().join("other.sqlite3");
        assert!(init_bridge(Some(other.to_str().unwrap().to_string()))
            .contains("refusing to switch"));

        let granted = invoke("requestPermission".to_string(), String::new()).await;
        assert!(granted.ok);
        assert_eq!(granted.value_json.as_deref(), Some("true"));

        let default_id = invoke("getDefaultListId".to_string(), String::new()).await;
        let default_id: Value = serde_json::from_str(default_id.value_json.as_deref().unwrap()).unwrap();
        assert!(default_id.is_string());

        let arguments = json!({
            "reminder": {
                "listId": default_id,
                "title": "Milk",
                "priority": 0,
                "isCompleted": false
            }
        });
        let created = invoke("createReminder".to_string(), arguments.to_string()).await;
        assert!(created.ok, "{:?}", created.error_message);

        let missing = invoke(
            "deleteReminder".to_string(),
            json!({"id": "missing"}).to_string(),
        )
        .await;
        assert!(!missing.ok);
        assert_eq!(missing.error_code.as_deref(), Some("REMINDER_NOT_FOUND"));
        assert_eq!(missing.error_message.as_deref(), Some("Reminder not found."));

        let unknown = invoke("launchRockets".to_string(), String::new()).await;
        assert!(unknown.not_implemented);
        assert!(!unknown.ok);
    }
}
