//! Query builder write operations: INSERT, UPDATE, DELETE.

use serde_json::Value;
use tracing::warn;

use super::builder::QueryBuilder;
use super::execution::run_execute;
use super::sql_generation::{compile_wheres, placeholders};
use crate::connection::Connection;
use crate::error::{DbError, DbResult};
use crate::identifier::{escape_column, validate_column};

impl QueryBuilder {
    /// Insert one row. Returns the connection-reported insert id, when
    /// the table has an auto-increment key.
    pub async fn insert(
        self,
        conn: &dyn Connection,
        row: Vec<(String, Value)>,
    ) -> DbResult<Option<u64>> {
        if row.is_empty() {
            return Err(DbError::Execution("insert with no columns".to_string()));
        }

        let mut columns = Vec::with_capacity(row.len());
        let mut bindings = Vec::with_capacity(row.len());
        for (column, value) in row {
            validate_column(&column)?;
            columns.push(escape_column(&column));
            bindings.push(value);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders(bindings.len())
        );

        let (_, last_insert_id) = run_execute(conn, &sql, bindings).await?;
        Ok(last_insert_id)
    }

    /// Insert several rows in one statement. The column set is taken from
    /// the first row; a column missing from a later row binds NULL.
    /// Returns the number of inserted rows.
    pub async fn insert_many(
        self,
        conn: &dyn Connection,
        rows: Vec<Vec<(String, Value)>>,
    ) -> DbResult<u64> {
        let Some(first) = rows.first() else {
            return Ok(0);
        };

        let mut columns = Vec::with_capacity(first.len());
        for (column, _) in first {
            validate_column(column)?;
            columns.push(column.clone());
        }

        let row_placeholders = format!("({})", placeholders(columns.len()));
        let mut bindings = Vec::with_capacity(columns.len() * rows.len());
        for row in &rows {
            for column in &columns {
                let value = row
                    .iter()
                    .find(|(c, _)| c == column)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::Null);
                bindings.push(value);
            }
        }

        let escaped: Vec<String> = columns.iter().map(|c| escape_column(c)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            escaped.join(", "),
            vec![row_placeholders; rows.len()].join(", ")
        );

        let (affected, _) = run_execute(conn, &sql, bindings).await?;
        Ok(affected)
    }

    /// Insert rows in chunks of `batch_size` multi-row statements.
    /// Returns the total number of inserted rows.
    pub async fn batch_insert(
        self,
        conn: &dyn Connection,
        rows: Vec<Vec<(String, Value)>>,
        batch_size: usize,
    ) -> DbResult<u64> {
        let batch_size = batch_size.max(1);
        let mut total = 0;
        let mut rows = rows;
        while !rows.is_empty() {
            let rest = rows.split_off(rows.len().min(batch_size));
            total += self.clone().insert_many(conn, rows).await?;
            rows = rest;
        }
        Ok(total)
    }

    /// Update matching rows. Refuses to run without a WHERE clause
    /// unless [`allow_unconditional`](Self::allow_unconditional) was
    /// called. Returns the affected row count.
    pub async fn update(
        self,
        conn: &dyn Connection,
        data: Vec<(String, Value)>,
    ) -> DbResult<u64> {
        if data.is_empty() {
            return Err(DbError::Execution("update with no columns".to_string()));
        }
        self.guard_unconditional("UPDATE")?;

        let mut assignments = Vec::with_capacity(data.len());
        let mut bindings = Vec::with_capacity(data.len());
        for (column, value) in data {
            validate_column(&column)?;
            assignments.push(format!("{} = ?", escape_column(&column)));
            bindings.push(value);
        }

        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            // SET bindings precede WHERE bindings, matching placeholder order
            sql.push_str(&compile_wheres(&self.wheres, &mut bindings));
        }

        let (affected, _) = run_execute(conn, &sql, bindings).await?;
        Ok(affected)
    }

    /// Update many rows, one statement per row, matching on
    /// `key_column`. Rows missing the key column are skipped. Returns
    /// the total affected row count.
    pub async fn batch_update(
        self,
        conn: &dyn Connection,
        rows: Vec<Vec<(String, Value)>>,
        key_column: &str,
    ) -> DbResult<u64> {
        validate_column(key_column)?;

        let mut total = 0;
        for mut row in rows {
            let Some(pos) = row.iter().position(|(c, _)| c == key_column) else {
                continue;
            };
            let (_, key_value) = row.remove(pos);
            if row.is_empty() {
                continue;
            }
            total += QueryBuilder::table(&self.table)?
                .where_eq(key_column, key_value)?
                .update(conn, row)
                .await?;
        }
        Ok(total)
    }

    /// Delete matching rows, with the same unconditional-statement guard
    /// as [`update`](Self::update). Returns the affected row count.
    pub async fn delete(self, conn: &dyn Connection) -> DbResult<u64> {
        self.guard_unconditional("DELETE")?;

        let mut bindings = Vec::new();
        let mut sql = format!("DELETE FROM {}", self.table);
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&compile_wheres(&self.wheres, &mut bindings));
        }

        let (affected, _) = run_execute(conn, &sql, bindings).await?;
        Ok(affected)
    }

    fn guard_unconditional(&self, statement: &'static str) -> DbResult<()> {
        if self.wheres.is_empty() {
            if !self.unconditional_ok {
                return Err(DbError::UnconditionedMutation {
                    statement,
                    table: self.table.clone(),
                });
            }
            warn!(table = %self.table, statement, "whole-table mutation");
        }
        Ok(())
    }
}
