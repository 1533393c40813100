//! Client-state domain model.
//!
//! # Responsibility
//! - Define the session/profile record and the notification entry.
//! - Own the persisted JSON shapes so stores never hand-build JSON.
//!
//! # Invariants
//! - Every shape here deserializes data written by the web dashboard.

pub mod notification;
pub mod session;
