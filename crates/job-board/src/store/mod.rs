//! SQLite-backed implementation of every workflow repository.
//!
//! A single connection sits behind a mutex. Each trait method runs one statement
//! or one transaction while holding the lock, so no caller ever observes a
//! half-applied workflow write.

mod accounts;
mod applications;
mod catalog;
mod notifications;
mod profiles;
mod schema;
pub mod seed;
mod vacancies;

use std::sync::{Mutex, MutexGuard};

use rusqlite::{ffi, Connection};

use crate::config::DatabaseConfig;
use crate::workflows::RepositoryError;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the configured database and apply the schema.
    pub fn open(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.path)?
        };
        Self::from_connection(conn)
    }

    /// Ephemeral store used by tests and `:memory:` configurations.
    pub fn in_memory() -> Result<Self, RepositoryError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, RepositoryError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    /// Cheap liveness probe for readiness checks.
    pub fn ping(&self) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message) => match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    RepositoryError::Conflict
                }
                ffi::SQLITE_CONSTRAINT_CHECK => RepositoryError::Constraint(
                    message
                        .clone()
                        .unwrap_or_else(|| "check constraint failed".to_string()),
                ),
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    RepositoryError::Constraint("referenced record does not exist".to_string())
                }
                _ => RepositoryError::Unavailable(err.to_string()),
            },
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound,
            _ => RepositoryError::Unavailable(err.to_string()),
        }
    }
}

/// Decode a text column holding one of a fixed set of labels.
fn enum_column<T>(
    row: &rusqlite::Row<'_>,
    column: &str,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unexpected {column} value {raw:?}").into(),
        )
    })
}

/// `?1, ?2, ...` placeholder list for `IN` clauses.
fn placeholders(count: usize, offset: usize) -> String {
    (1..=count)
        .map(|index| format!("?{}", index + offset))
        .collect::<Vec<_>>()
        .join(", ")
}
