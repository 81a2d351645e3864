pub mod error;
pub mod migrations;
pub mod models;
pub mod thoughts;
pub mod users;

pub use error::{Result, StoreError};

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// SQLite-backed store for users and thoughts. Every public operation takes
/// the connection lock once; operations are never grouped into a transaction.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }
}

/// Most ids bound into a single `IN (...)` clause. SQLite rejects statements
/// with more than 32766 parameters.
pub(crate) const ID_BATCH: usize = 500;

/// Runs `query` once per batch of at most `ID_BATCH` ids and concatenates the
/// results.
pub(crate) fn in_batches<T, F>(ids: &[String], mut query: F) -> Result<Vec<T>>
where
    F: FnMut(&[String]) -> Result<Vec<T>>,
{
    let mut out = Vec::new();
    for batch in ids.chunks(ID_BATCH) {
        out.extend(query(batch)?);
    }
    Ok(out)
}

/// `?1, ?2, ...` for an `IN (...)` clause of `n` parameters.
pub(crate) fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}
