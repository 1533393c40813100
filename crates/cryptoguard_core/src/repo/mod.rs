//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the key-value contract client stores persist through.
//! - Isolate SQLite query details from store orchestration.
//!
//! # Invariants
//! - Values are opaque strings here; JSON shape belongs to the stores.
//! - Multi-key writes are atomic.

pub mod keys;
pub mod kv_repo;
