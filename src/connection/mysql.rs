//! MySQL adapter built on sqlx.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row as SqlxRow, TypeInfo};

use super::{Connection, PoolConfig, Row, Statement};
use crate::error::{DbError, DbResult};

/// Pooled MySQL connection.
#[derive(Debug, Clone)]
pub struct MySqlAdapter {
    pool: MySqlPool,
}

impl MySqlAdapter {
    /// Connect to `database_url` with the given pool settings.
    pub async fn connect(database_url: &str, config: PoolConfig) -> DbResult<Self> {
        let mut options = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds));

        if let Some(idle_timeout) = config.idle_timeout_seconds {
            options = options.idle_timeout(Duration::from_secs(idle_timeout));
        }

        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| DbError::Execution(format!("failed to create MySQL pool: {}", e)))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Close the pool, waiting for in-flight connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Connection for MySqlAdapter {
    async fn prepare(&self, sql: &str, bindings: Vec<Value>) -> DbResult<Box<dyn Statement>> {
        Ok(Box::new(MySqlStatement {
            pool: self.pool.clone(),
            sql: sql.to_string(),
            bindings,
            affected: 0,
            last_insert_id: None,
        }))
    }

    async fn query(&self, sql: &str) -> DbResult<Vec<Row>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_map).collect()
    }
}

/// A statement plus its bound parameters, ready to run on the pool.
pub struct MySqlStatement {
    pool: MySqlPool,
    sql: String,
    bindings: Vec<Value>,
    affected: u64,
    last_insert_id: Option<u64>,
}

impl MySqlStatement {
    fn build(&self) -> sqlx::query::Query<'_, sqlx::MySql, MySqlArguments> {
        let mut query = sqlx::query(&self.sql);
        for value in &self.bindings {
            query = bind_value(query, value);
        }
        query
    }
}

#[async_trait]
impl Statement for MySqlStatement {
    async fn execute(&mut self) -> DbResult<()> {
        let result = self.build().execute(&self.pool).await?;
        self.affected = result.rows_affected();
        // MySQL reports 0 when the table has no auto-increment column
        self.last_insert_id = match result.last_insert_id() {
            0 => None,
            id => Some(id),
        };
        Ok(())
    }

    async fn fetch_all_rows(&mut self) -> DbResult<Vec<Row>> {
        let rows = self.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_map).collect()
    }

    fn affected_row_count(&self) -> u64 {
        self.affected
    }

    fn last_insert_id(&self) -> Option<u64> {
        self.last_insert_id
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::MySql, MySqlArguments>,
    value: &Value,
) -> sqlx::query::Query<'q, sqlx::MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => query.bind(s.clone()),
        // Arrays and objects are stored as JSON text
        other => query.bind(other.to_string()),
    }
}

/// Decode a driver row into a JSON map keyed by column name, using the
/// column type to pick a decoding. NULL in any column becomes
/// `Value::Null`.
fn row_to_map(row: &MySqlRow) -> DbResult<Row> {
    let mut map = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, index, column.type_info().name())?;
        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> DbResult<Value> {
    let value = match type_name {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)?
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)?
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row
            .try_get::<Option<u64>, _>(index)?
            .map(Value::from)
            .unwrap_or(Value::Null),
        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|f| Value::from(f as f64))
            .unwrap_or(Value::Null),
        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)?
            .map(Value::from)
            .unwrap_or(Value::Null),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
            .map(|dt| Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)?
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)?
            .map(|t| Value::String(t.to_string()))
            .unwrap_or(Value::Null),
        "JSON" => row
            .try_get::<Option<Value>, _>(index)?
            .unwrap_or(Value::Null),
        "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "VARBINARY" | "BINARY" => row
            .try_get::<Option<Vec<u8>>, _>(index)?
            .map(|bytes| Value::Array(bytes.into_iter().map(Value::from).collect()))
            .unwrap_or(Value::Null),
        // DECIMAL, CHAR, VARCHAR, TEXT and anything unrecognized decode
        // as text
        _ => row
            .try_get::<Option<String>, _>(index)?
            .map(Value::String)
            .unwrap_or(Value::Null),
    };
    Ok(value)
}
