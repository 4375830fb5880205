//! Scripted fakes for exercising terminal operations without a server.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::connection::{Connection, Row, Statement};
use crate::error::DbResult;

/// Build a [`Row`] from a `json!({...})` literal.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("row() needs a JSON object, got {}", other),
    }
}

/// Build the column/value pair list that insert and update take.
pub fn row_pairs(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
    pairs
        .iter()
        .map(|(column, value)| ((*column).to_string(), value.clone()))
        .collect()
}

/// Connection fake that records every prepared statement and replays
/// scripted result sets in push order.
#[derive(Default)]
pub struct FakeConnection {
    responses: Arc<Mutex<VecDeque<Vec<Row>>>>,
    log: Mutex<Vec<(String, Vec<Value>)>>,
    affected: Mutex<u64>,
    last_insert_id: Mutex<Option<u64>>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result set for the next fetching statement.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.responses.lock().unwrap().push_back(rows);
    }

    pub fn set_affected(&self, affected: u64) {
        *self.affected.lock().unwrap() = affected;
    }

    pub fn set_last_insert_id(&self, id: Option<u64>) {
        *self.last_insert_id.lock().unwrap() = id;
    }

    /// Number of statements prepared so far.
    pub fn query_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    /// SQL text and bindings of the most recent statement.
    pub fn last_statement(&self) -> Option<(String, Vec<Value>)> {
        self.log.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn prepare(&self, sql: &str, bindings: Vec<Value>) -> DbResult<Box<dyn Statement>> {
        self.log.lock().unwrap().push((sql.to_string(), bindings));
        Ok(Box::new(FakeStatement {
            responses: Arc::clone(&self.responses),
            affected: *self.affected.lock().unwrap(),
            last_insert_id: *self.last_insert_id.lock().unwrap(),
        }))
    }
}

struct FakeStatement {
    responses: Arc<Mutex<VecDeque<Vec<Row>>>>,
    affected: u64,
    last_insert_id: Option<u64>,
}

#[async_trait]
impl Statement for FakeStatement {
    async fn execute(&mut self) -> DbResult<()> {
        Ok(())
    }

    async fn fetch_all_rows(&mut self) -> DbResult<Vec<Row>> {
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    fn affected_row_count(&self) -> u64 {
        self.affected
    }

    fn last_insert_id(&self) -> Option<u64> {
        self.last_insert_id
    }
}

/// Connection fake that cannot prepare, only run plain text. Exercises
/// the bindings-free fallback path.
pub struct QueryOnlyConnection {
    rows: Mutex<Vec<Row>>,
}

impl QueryOnlyConnection {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }
}

#[async_trait]
impl Connection for QueryOnlyConnection {
    async fn query(&self, _sql: &str) -> DbResult<Vec<Row>> {
        Ok(self.rows.lock().unwrap().clone())
    }
}
