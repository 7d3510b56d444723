//! Core domain logic for the reminders bridge.
//! This crate owns permission negotiation and the reminders CRUD contract;
//! transports and native store bindings plug in around it.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod permission;
pub mod service;
pub mod store;

pub use error::{ReminderError, ReminderResult, StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::authorization::{
    AuthorizationStatus, CapabilityModel, OperationClass, RawAuthorization,
};
pub use model::reminder::{DueDate, ListDraft, Reminder, ReminderDraft, ReminderList};
pub use permission::PermissionNegotiator;
pub use service::reminder_service::RemindersService;
pub use store::sqlite::{PromptPolicy, SqliteReminderStore};
pub use store::{ItemFilter, ReminderStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
