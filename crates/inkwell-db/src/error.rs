use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE constraint failed. Carries the offending column(s) as SQLite
    /// reports them, e.g. `users.nickname`.
    #[error("unique constraint failed: {0}")]
    Conflict(String),

    #[error("referenced row does not exist")]
    InvalidReference,

    #[error("row not found")]
    NotFound,

    #[error("database lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &err {
            if failure.code == ErrorCode::ConstraintViolation {
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                    return Self::InvalidReference;
                }
                if let Some(columns) = message
                    .as_deref()
                    .and_then(|m| m.strip_prefix("UNIQUE constraint failed: "))
                {
                    return Self::Conflict(columns.to_string());
                }
            }
        }

        match err {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound,
            other => Self::Sqlite(other),
        }
    }
}
