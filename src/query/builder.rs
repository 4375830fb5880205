//! Query builder - core builder state.

use super::types::*;
use crate::error::DbResult;
use crate::identifier::validate_table;

/// Fluent builder for a single SQL statement.
///
/// Chainable methods consume and return the builder; methods that accept
/// identifiers or operators validate them immediately and return
/// `DbResult<Self>`. A terminal operation (`get`, `first`, `count`,
/// `insert`, `update`, `delete`, ...) consumes the builder, compiles SQL
/// text plus an ordered binding list and hands both to a
/// [`Connection`](crate::connection::Connection).
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) table: String,
    pub(crate) selects: Vec<String>,
    pub(crate) wheres: Vec<WhereNode>,
    pub(crate) joins: Vec<JoinSpec>,
    pub(crate) groups: Vec<String>,
    pub(crate) having: Option<Having>,
    pub(crate) orders: Vec<(String, OrderDirection)>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) unconditional_ok: bool,
}

impl QueryBuilder {
    /// Start a query against `table`. The table name is validated here,
    /// so a builder in hand always carries a safe table identifier.
    pub fn table(table: &str) -> DbResult<Self> {
        validate_table(table)?;
        Ok(Self {
            table: table.to_string(),
            selects: Vec::new(),
            wheres: Vec::new(),
            joins: Vec::new(),
            groups: Vec::new(),
            having: None,
            orders: Vec::new(),
            limit: None,
            offset: None,
            unconditional_ok: false,
        })
    }

    /// Fresh sub-builder for nested WHERE groups. The table is already
    /// validated, so this cannot fail.
    pub(crate) fn sub(&self) -> Self {
        Self {
            table: self.table.clone(),
            selects: Vec::new(),
            wheres: Vec::new(),
            joins: Vec::new(),
            groups: Vec::new(),
            having: None,
            orders: Vec::new(),
            limit: None,
            offset: None,
            unconditional_ok: false,
        }
    }

    /// Confirm that a following `update` or `delete` may run without any
    /// WHERE clause, affecting the whole table.
    pub fn allow_unconditional(mut self) -> Self {
        self.unconditional_ok = true;
        self
    }

    /// Table this builder targets.
    pub fn table_name(&self) -> &str {
        &self.table
    }
}
