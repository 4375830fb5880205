//! Query builder types - the condition model and clause enums.

use std::fmt;

use serde_json::Value;

use crate::error::{DbError, DbResult};

/// Boolean connector between WHERE nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => write!(f, "AND"),
            BoolOp::Or => write!(f, "OR"),
        }
    }
}

/// Comparison operators accepted in WHERE, JOIN ... ON and HAVING
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Like,
    NotLike,
}

impl Operator {
    /// Parse an operator from its SQL spelling. Anything outside the
    /// allow-list is rejected before SQL text is produced.
    pub fn parse(op: &str) -> DbResult<Self> {
        match op.to_uppercase().as_str() {
            "=" => Ok(Operator::Equal),
            "!=" | "<>" => Ok(Operator::NotEqual),
            "<" => Ok(Operator::LessThan),
            ">" => Ok(Operator::GreaterThan),
            "<=" => Ok(Operator::LessThanOrEqual),
            ">=" => Ok(Operator::GreaterThanOrEqual),
            "LIKE" => Ok(Operator::Like),
            "NOT LIKE" => Ok(Operator::NotLike),
            _ => Err(DbError::InvalidIdentifier(format!(
                "unsupported operator '{}'",
                op
            ))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Equal => write!(f, "="),
            Operator::NotEqual => write!(f, "!="),
            Operator::LessThan => write!(f, "<"),
            Operator::GreaterThan => write!(f, ">"),
            Operator::LessThanOrEqual => write!(f, "<="),
            Operator::GreaterThanOrEqual => write!(f, ">="),
            Operator::Like => write!(f, "LIKE"),
            Operator::NotLike => write!(f, "NOT LIKE"),
        }
    }
}

/// One node of the WHERE expression tree. Values live inside the nodes;
/// the binding list is produced during compilation, in placeholder order.
#[derive(Debug, Clone)]
pub enum WhereNode {
    Basic {
        column: String,
        operator: Operator,
        value: Value,
        boolean: BoolOp,
    },
    In {
        column: String,
        values: Vec<Value>,
        boolean: BoolOp,
    },
    Null {
        column: String,
        boolean: BoolOp,
    },
    NotNull {
        column: String,
        boolean: BoolOp,
    },
    /// A parenthesized sub-expression built by a nested closure
    Nested {
        nodes: Vec<WhereNode>,
        boolean: BoolOp,
    },
}

impl WhereNode {
    pub(crate) fn boolean(&self) -> BoolOp {
        match self {
            WhereNode::Basic { boolean, .. }
            | WhereNode::In { boolean, .. }
            | WhereNode::Null { boolean, .. }
            | WhereNode::NotNull { boolean, .. }
            | WhereNode::Nested { boolean, .. } => *boolean,
        }
    }
}

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER JOIN"),
            JoinKind::Left => write!(f, "LEFT JOIN"),
            JoinKind::Right => write!(f, "RIGHT JOIN"),
            JoinKind::Full => write!(f, "FULL JOIN"),
        }
    }
}

/// Join clause
#[derive(Debug, Clone)]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub table: String,
    pub left: String,
    pub operator: Operator,
    pub right: String,
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// HAVING clause (single condition, bound like a WHERE value)
#[derive(Debug, Clone)]
pub struct Having {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}
