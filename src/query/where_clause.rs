//! Query builder WHERE clause operations.

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;
use crate::error::DbResult;
use crate::identifier::validate_column;

impl QueryBuilder {
    /// Add a WHERE condition with equality (the two-argument form).
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> DbResult<Self> {
        self.push_basic(column, Operator::Equal, value.into(), BoolOp::And)
    }

    /// Add a WHERE condition with an explicit operator.
    pub fn where_op<T: Into<Value>>(self, column: &str, operator: &str, value: T) -> DbResult<Self> {
        let operator = Operator::parse(operator)?;
        self.push_basic(column, operator, value.into(), BoolOp::And)
    }

    /// Add an OR WHERE condition with equality.
    pub fn or_where<T: Into<Value>>(self, column: &str, value: T) -> DbResult<Self> {
        self.push_basic(column, Operator::Equal, value.into(), BoolOp::Or)
    }

    /// Add an OR WHERE condition with an explicit operator.
    pub fn or_where_op<T: Into<Value>>(
        self,
        column: &str,
        operator: &str,
        value: T,
    ) -> DbResult<Self> {
        let operator = Operator::parse(operator)?;
        self.push_basic(column, operator, value.into(), BoolOp::Or)
    }

    /// Add a WHERE IN condition. An empty value list compiles to the
    /// always-false predicate `1 = 0` rather than invalid `IN ()` SQL.
    pub fn where_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> DbResult<Self> {
        self.push_in(column, values, BoolOp::And)
    }

    /// Add an OR WHERE IN condition.
    pub fn or_where_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> DbResult<Self> {
        self.push_in(column, values, BoolOp::Or)
    }

    /// Add a WHERE IS NULL condition.
    pub fn where_null(mut self, column: &str) -> DbResult<Self> {
        validate_column(column)?;
        self.wheres.push(WhereNode::Null {
            column: column.to_string(),
            boolean: BoolOp::And,
        });
        Ok(self)
    }

    /// Add an OR WHERE IS NULL condition.
    pub fn or_where_null(mut self, column: &str) -> DbResult<Self> {
        validate_column(column)?;
        self.wheres.push(WhereNode::Null {
            column: column.to_string(),
            boolean: BoolOp::Or,
        });
        Ok(self)
    }

    /// Add a WHERE IS NOT NULL condition.
    pub fn where_not_null(mut self, column: &str) -> DbResult<Self> {
        validate_column(column)?;
        self.wheres.push(WhereNode::NotNull {
            column: column.to_string(),
            boolean: BoolOp::And,
        });
        Ok(self)
    }

    /// Add an OR WHERE IS NOT NULL condition.
    pub fn or_where_not_null(mut self, column: &str) -> DbResult<Self> {
        validate_column(column)?;
        self.wheres.push(WhereNode::NotNull {
            column: column.to_string(),
            boolean: BoolOp::Or,
        });
        Ok(self)
    }

    /// Add a parenthesized WHERE group. The closure receives a fresh
    /// sub-builder; its condition list becomes one nested node.
    ///
    /// ```ignore
    /// let q = QueryBuilder::table("posts")?
    ///     .where_eq("status", "publish")?
    ///     .where_nested(|q| q.where_eq("author_id", 1)?.or_where("author_id", 2))?;
    /// ```
    pub fn where_nested<F>(self, f: F) -> DbResult<Self>
    where
        F: FnOnce(QueryBuilder) -> DbResult<QueryBuilder>,
    {
        self.push_nested(f, BoolOp::And)
    }

    /// Add an OR-connected parenthesized WHERE group.
    pub fn or_where_nested<F>(self, f: F) -> DbResult<Self>
    where
        F: FnOnce(QueryBuilder) -> DbResult<QueryBuilder>,
    {
        self.push_nested(f, BoolOp::Or)
    }

    fn push_basic(
        mut self,
        column: &str,
        operator: Operator,
        value: Value,
        boolean: BoolOp,
    ) -> DbResult<Self> {
        validate_column(column)?;
        self.wheres.push(WhereNode::Basic {
            column: column.to_string(),
            operator,
            value,
            boolean,
        });
        Ok(self)
    }

    fn push_in<T: Into<Value>>(
        mut self,
        column: &str,
        values: Vec<T>,
        boolean: BoolOp,
    ) -> DbResult<Self> {
        validate_column(column)?;
        self.wheres.push(WhereNode::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            boolean,
        });
        Ok(self)
    }

    fn push_nested<F>(mut self, f: F, boolean: BoolOp) -> DbResult<Self>
    where
        F: FnOnce(QueryBuilder) -> DbResult<QueryBuilder>,
    {
        let sub = f(self.sub())?;
        self.wheres.push(WhereNode::Nested {
            nodes: sub.wheres,
            boolean,
        });
        Ok(self)
    }
}
