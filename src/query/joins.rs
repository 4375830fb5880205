//! Query builder JOIN operations.

use super::builder::QueryBuilder;
use super::types::*;
use crate::error::{DbError, DbResult};
use crate::identifier::{validate_column, validate_table};

impl QueryBuilder {
    /// Add an INNER JOIN.
    pub fn join(self, table: &str, left: &str, operator: &str, right: &str) -> DbResult<Self> {
        self.join_kind(table, left, operator, right, JoinKind::Inner)
    }

    /// Add a LEFT JOIN.
    pub fn left_join(self, table: &str, left: &str, operator: &str, right: &str) -> DbResult<Self> {
        self.join_kind(table, left, operator, right, JoinKind::Left)
    }

    /// Add a RIGHT JOIN.
    pub fn right_join(
        self,
        table: &str,
        left: &str,
        operator: &str,
        right: &str,
    ) -> DbResult<Self> {
        self.join_kind(table, left, operator, right, JoinKind::Right)
    }

    /// Add a FULL JOIN.
    pub fn full_join(self, table: &str, left: &str, operator: &str, right: &str) -> DbResult<Self> {
        self.join_kind(table, left, operator, right, JoinKind::Full)
    }

    /// Add a join with an explicit kind. Table, both columns and the
    /// operator are validated before anything touches SQL text.
    pub fn join_kind(
        mut self,
        table: &str,
        left: &str,
        operator: &str,
        right: &str,
        kind: JoinKind,
    ) -> DbResult<Self> {
        validate_table(table)?;
        validate_column(left)?;
        validate_column(right)?;
        let operator = Operator::parse(operator)?;
        self.joins.push(JoinSpec {
            kind,
            table: table.to_string(),
            left: left.to_string(),
            operator,
            right: right.to_string(),
        });
        Ok(self)
    }

    /// Parse a join kind from its SQL spelling.
    pub fn parse_join_kind(kind: &str) -> DbResult<JoinKind> {
        match kind.to_uppercase().as_str() {
            "INNER" => Ok(JoinKind::Inner),
            "LEFT" => Ok(JoinKind::Left),
            "RIGHT" => Ok(JoinKind::Right),
            "FULL" => Ok(JoinKind::Full),
            _ => Err(DbError::InvalidIdentifier(format!(
                "unsupported join kind '{}'",
                kind
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_validation() {
        let q = QueryBuilder::table("posts").unwrap();
        assert!(q
            .clone()
            .join("users", "posts.user_id", "=", "users.id")
            .is_ok());

        assert!(q
            .clone()
            .join("users;DROP TABLE x", "posts.user_id", "=", "users.id")
            .is_err());
        assert!(q
            .clone()
            .join("users", "posts.user_id; --", "=", "users.id")
            .is_err());
        assert!(q.join("users", "posts.user_id", "UNION", "users.id").is_err());
    }

    #[test]
    fn test_parse_join_kind() {
        assert_eq!(
            QueryBuilder::parse_join_kind("left").unwrap(),
            JoinKind::Left
        );
        assert!(QueryBuilder::parse_join_kind("CROSS APPLY").is_err());
    }
}
