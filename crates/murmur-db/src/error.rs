use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column already holds the value.
    #[error("{field} is already taken")]
    Conflict { field: &'static str },

    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("database lock poisoned")]
    Poisoned,

    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, Some(msg)) = &err {
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                // SQLite reports "UNIQUE constraint failed: users.username"
                if msg.ends_with("users.username") {
                    return Self::Conflict { field: "username" };
                }
                if msg.ends_with("users.email") {
                    return Self::Conflict { field: "email" };
                }
            }
        }
        Self::Sqlite(err)
    }
}
