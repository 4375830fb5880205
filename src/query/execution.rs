//! Query builder terminal read operations.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use super::builder::QueryBuilder;
use crate::connection::{Connection, Row};
use crate::error::{DbError, DbResult};

/// Queries slower than this are logged at WARN level.
pub(crate) const SLOW_QUERY_MS: u128 = 100;

impl QueryBuilder {
    /// Execute the query and return all matching rows.
    pub async fn get(self, conn: &dyn Connection) -> DbResult<Vec<Row>> {
        let (sql, bindings) = self.to_sql();
        run_fetch(conn, &sql, bindings).await
    }

    /// Execute with LIMIT 1 and return the first row, if any.
    pub async fn first(mut self, conn: &dyn Connection) -> DbResult<Option<Row>> {
        self.limit = Some(1);
        let mut rows = self.get(conn).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Return a single column of the first matching row.
    pub async fn value(self, conn: &dyn Connection, column: &str) -> DbResult<Option<Value>> {
        let row = self.select(&[column])?.first(conn).await?;
        Ok(row.and_then(|mut r| r.remove(column)))
    }

    /// Count all matching rows. Any configured projection is replaced by
    /// the aggregate.
    pub async fn count(self, conn: &dyn Connection) -> DbResult<i64> {
        self.count_column("*").await_count(conn).await
    }

    /// Count non-null values of one column.
    pub async fn count_value(self, conn: &dyn Connection, column: &str) -> DbResult<i64> {
        crate::identifier::validate_column(column)?;
        self.count_column(column).await_count(conn).await
    }

    /// Whether at least one row matches. Implemented as `count > 0`.
    pub async fn exists(self, conn: &dyn Connection) -> DbResult<bool> {
        Ok(self.count(conn).await? > 0)
    }

    fn count_column(mut self, column: &str) -> Self {
        self.selects = vec![format!("COUNT({}) AS count", column)];
        // LIMIT/OFFSET would make the aggregate count a page, not the set
        self.limit = None;
        self.offset = None;
        self.orders.clear();
        self
    }

    async fn await_count(self, conn: &dyn Connection) -> DbResult<i64> {
        let row = self.first(conn).await?;
        Ok(row
            .and_then(|r| r.get("count").and_then(Value::as_i64))
            .unwrap_or(0))
    }
}

/// Run a fetching statement through the connection, logging timing.
///
/// When the connection does not support prepared statements and the
/// statement carries no bindings, fall back to the plain-text `query`
/// path. A statement WITH bindings never falls back.
pub(crate) async fn run_fetch(
    conn: &dyn Connection,
    sql: &str,
    bindings: Vec<Value>,
) -> DbResult<Vec<Row>> {
    let started = Instant::now();
    let had_bindings = !bindings.is_empty();

    let result = match conn.prepare(sql, bindings).await {
        Ok(mut statement) => statement.fetch_all_rows().await,
        Err(DbError::UnsupportedConnection) if !had_bindings => conn.query(sql).await,
        Err(e) => Err(e),
    };

    log_statement(sql, started);
    result
}

/// Run a mutating statement, returning the affected row count and the
/// last insert id reported by the connection.
pub(crate) async fn run_execute(
    conn: &dyn Connection,
    sql: &str,
    bindings: Vec<Value>,
) -> DbResult<(u64, Option<u64>)> {
    let started = Instant::now();

    let mut statement = conn.prepare(sql, bindings).await?;
    let result = statement.execute().await;

    log_statement(sql, started);
    result?;
    Ok((statement.affected_row_count(), statement.last_insert_id()))
}

fn log_statement(sql: &str, started: Instant) {
    let elapsed_ms = started.elapsed().as_millis();
    if elapsed_ms > SLOW_QUERY_MS {
        warn!(sql = %sql, elapsed_ms = elapsed_ms as u64, "slow query");
    } else {
        debug!(sql = %sql, elapsed_ms = elapsed_ms as u64, "query executed");
    }
}
