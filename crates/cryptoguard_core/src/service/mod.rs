//! Client-state stores and their read models.
//!
//! # Responsibility
//! - Expose the session and notification stores UI layers inject.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod clock;
pub mod notification_service;
pub mod notification_view;
pub mod session_service;
