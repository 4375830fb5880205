//! Error types for the database core.
//!
//! Identifier problems surface before any SQL text exists; execution
//! problems are passed through from the connection adapter untouched.

use thiserror::Error;

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for query building and execution
#[derive(Debug, Clone, Error)]
pub enum DbError {
    /// Table/column name, operator, join kind or sort direction failed
    /// allow-list validation. Raised before any SQL is built.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The connection adapter supports neither prepared statements nor
    /// raw queries usable for this statement.
    #[error("connection adapter supports neither prepared statements nor raw queries")]
    UnsupportedConnection,

    /// Execution failure reported by the connection adapter. Never
    /// retried here; retry/backoff policy belongs to the caller.
    #[error("query execution failed: {0}")]
    Execution(String),

    /// UPDATE or DELETE was built without any WHERE clause. Running a
    /// table-wide mutation requires `allow_unconditional()`.
    #[error("{statement} on `{table}` has no WHERE clause; call allow_unconditional() to run it table-wide")]
    UnconditionedMutation {
        statement: &'static str,
        table: String,
    },
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Execution(err.to_string())
    }
}
