//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Keep FFI/transport layers decoupled from store details.

pub mod reminder_service;
