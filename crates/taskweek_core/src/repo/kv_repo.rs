//! Key-value snapshot repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store and fetch whole string values under fixed keys.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `put` overwrites the previous value atomically; there is no merge.
//! - Construction fails on connections that have not been migrated.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

const KV_TABLE: &str = "kv_entries";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for key-value persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection schema is older than this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is below required {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } | Self::MissingRequiredTable(_) => None,
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

/// Durable string storage addressed by key.
pub trait KeyValueRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Returns whether a value existed.
    ///
    /// The task store never deletes its snapshot; this is for tests and
    /// maintenance tooling that need to simulate a first launch.
    fn remove(&self, key: &str) -> RepoResult<bool>;
}

/// SQLite-backed key-value repository over `kv_entries`.
pub struct SqliteKvRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvRepository<'conn> {
    /// Wraps a connection after checking it was opened through `open_db`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [KV_TABLE],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(RepoError::MissingRequiredTable(KV_TABLE));
        }

        Ok(Self { conn })
    }
}

impl KeyValueRepository for SqliteKvRepository<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
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

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }
}

impl<T: KeyValueRepository + ?Sized> KeyValueRepository for &T {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> RepoResult<bool> {
        (**self).remove(key)
    }
}
