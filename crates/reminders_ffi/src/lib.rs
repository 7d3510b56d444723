//! FFI surface for the reminders bridge.
//! Dart talks to `api`; `channel` and `config` are transport internals
//! usable from Rust hosts and tests.

pub mod api;
pub mod channel;
pub mod config;
