//! Domain model for reminder lists, reminder items and authorization.
//!
//! # Responsibility
//! - Define value snapshots exchanged between store, service and transport.
//! - Keep capability normalization in one place.
//!
//! # Invariants
//! - Model values never hold references into a backing store.

pub mod authorization;
pub mod reminder;
