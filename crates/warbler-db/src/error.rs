use rusqlite::ffi;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// Rejected before touching the store (empty text, self-follow, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("{column} already exists")]
    Conflict { column: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl DbError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                // SQLite reports "UNIQUE constraint failed: users.username"
                let column = msg
                    .as_deref()
                    .and_then(|m| m.rsplit(": ").next())
                    .and_then(|cols| cols.split(", ").next())
                    .and_then(|col| col.rsplit('.').next())
                    .unwrap_or("value")
                    .to_string();
                return Self::Conflict { column };
            }
        }
        Self::Sqlite(err)
    }
}
