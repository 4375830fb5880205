//! Connection abstraction: the seam between the query builder and a
//! concrete database driver.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{DbError, DbResult};

pub mod mysql;

pub use mysql::MySqlAdapter;

/// A result row, keyed by column name. Column order follows the
/// statement's projection because the map preserves insertion order.
pub type Row = serde_json::Map<String, Value>;

/// A database connection capable of preparing parameterized statements.
///
/// `prepare` is the primary path; `query` is a plain-text escape hatch
/// for connections that cannot prepare, and is only ever used for
/// statements without bindings. Both default to
/// [`DbError::UnsupportedConnection`] so an adapter implements what it
/// supports.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Prepare a statement with `?` placeholders and its bindings.
    async fn prepare(&self, sql: &str, bindings: Vec<Value>) -> DbResult<Box<dyn Statement>> {
        let _ = (sql, bindings);
        Err(DbError::UnsupportedConnection)
    }

    /// Run plain SQL text and fetch all rows. No parameters.
    async fn query(&self, sql: &str) -> DbResult<Vec<Row>> {
        let _ = sql;
        Err(DbError::UnsupportedConnection)
    }
}

/// A prepared statement bound to its parameters.
#[async_trait]
pub trait Statement: Send {
    /// Run the statement for its side effects.
    async fn execute(&mut self) -> DbResult<()>;

    /// Run the statement and fetch all result rows.
    async fn fetch_all_rows(&mut self) -> DbResult<Vec<Row>>;

    /// Rows affected by the last `execute`.
    fn affected_row_count(&self) -> u64;

    /// Auto-increment id assigned by the last `execute`, when the
    /// driver reports one.
    fn last_insert_id(&self) -> Option<u64>;
}

/// Connection pool tuning.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
        }
    }
}
