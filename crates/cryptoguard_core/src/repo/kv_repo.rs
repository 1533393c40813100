//! Key-value repository contracts with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Provide the persisted key-value surface every client store writes to.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Keys are non-empty and carry no surrounding whitespace.
//! - A batch passed to `apply` is committed entirely or not at all.
//! - Removing an absent key is not an error.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for key-value persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidKey(String),
    /// Backend refused the write (quota, read-only medium, injected failure).
    WriteRejected(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey(key) => write!(f, "invalid storage key: `{key}`"),
            Self::WriteRejected(reason) => write!(f, "storage write rejected: {reason}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidKey(_) | Self::WriteRejected(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One mutation inside an atomic write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Set { key: String, value: String },
    Remove { key: String },
}

impl KvWrite {
    pub fn set(key: &str, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.to_string(),
            value: value.into(),
        }
    }

    pub fn remove(key: &str) -> Self {
        Self::Remove {
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Remove { key } => key.as_str(),
        }
    }
}

/// Repository interface for persisted client state.
pub trait KvRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;

    /// Applies every write in order, atomically.
    fn apply(&self, writes: &[KvWrite]) -> RepoResult<()>;

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.apply(&[KvWrite::set(key, value)])
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.apply(&[KvWrite::remove(key)])
    }

    fn contains(&self, key: &str) -> RepoResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: KvRepository + ?Sized> KvRepository for &T {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get(key)
    }

    fn apply(&self, writes: &[KvWrite]) -> RepoResult<()> {
        (**self).apply(writes)
    }
}

/// SQLite-backed key-value repository.
///
/// Owns its connection so a store can live for the whole process.
pub struct SqliteKvRepository {
    conn: Connection,
}

impl SqliteKvRepository {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KvRepository for SqliteKvRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        validate_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn apply(&self, writes: &[KvWrite]) -> RepoResult<()> {
        for write in writes {
            validate_key(write.key())?;
        }

        // No other transaction is ever open on this connection.
        let tx = self.conn.unchecked_transaction()?;
        for write in writes {
            match write {
                KvWrite::Set { key, value } => {
                    tx.execute(
                        "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
                         ON CONFLICT(key) DO UPDATE SET
                            value = excluded.value,
                            updated_at = (strftime('%s', 'now') * 1000);",
                        params![key.as_str(), value.as_str()],
                    )?;
                }
                KvWrite::Remove { key } => {
                    tx.execute("DELETE FROM kv_entries WHERE key = ?1;", [key.as_str()])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// In-memory key-value repository.
///
/// Mirrors SQLite semantics, including batch atomicity. Writes can be made to
/// fail on demand to exercise best-effort persistence paths.
#[derive(Debug, Default)]
pub struct MemoryKvRepository {
    entries: RefCell<BTreeMap<String, String>>,
    reject_writes: Cell<bool>,
}

impl MemoryKvRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `true`, every subsequent `apply` fails without changing state.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KvRepository for MemoryKvRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn apply(&self, writes: &[KvWrite]) -> RepoResult<()> {
        for write in writes {
            validate_key(write.key())?;
        }
        if self.reject_writes.get() {
            return Err(RepoError::WriteRejected("memory backend is read-only".to_string()));
        }

        let mut entries = self.entries.borrow_mut();
        for write in writes {
            match write {
                KvWrite::Set { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                KvWrite::Remove { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }
}

fn validate_key(key: &str) -> RepoResult<()> {
    if key.is_empty() || key.trim() != key {
        return Err(RepoError::InvalidKey(key.to_string()));
    }
    Ok(())
}
