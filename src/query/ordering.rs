//! Query builder ORDER BY, GROUP BY and HAVING operations.

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;
use crate::error::DbResult;
use crate::identifier::validate_column;

impl QueryBuilder {
    /// Add an ascending ORDER BY clause.
    pub fn order_by(self, column: &str) -> DbResult<Self> {
        self.order_by_direction(column, OrderDirection::Asc)
    }

    /// Add a descending ORDER BY clause.
    pub fn order_by_desc(self, column: &str) -> DbResult<Self> {
        self.order_by_direction(column, OrderDirection::Desc)
    }

    /// Add an ORDER BY clause with an explicit direction.
    pub fn order_by_direction(mut self, column: &str, direction: OrderDirection) -> DbResult<Self> {
        validate_column(column)?;
        self.orders.push((column.to_string(), direction));
        Ok(self)
    }

    /// Add GROUP BY columns.
    pub fn group_by(mut self, columns: &[&str]) -> DbResult<Self> {
        for column in columns {
            validate_column(column)?;
            self.groups.push((*column).to_string());
        }
        Ok(self)
    }

    /// Set the HAVING condition. The value is parameter-bound like any
    /// WHERE value.
    pub fn having<T: Into<Value>>(
        mut self,
        column: &str,
        operator: &str,
        value: T,
    ) -> DbResult<Self> {
        validate_column(column)?;
        let operator = Operator::parse(operator)?;
        self.having = Some(Having {
            column: column.to_string(),
            operator,
            value: value.into(),
        });
        Ok(self)
    }
}
