//! Identifier validation for SQL injection prevention.
//!
//! Identifiers (table and column names) cannot be parameter-bound, so they
//! are checked against a character allow-list before ever being spliced
//! into SQL text. Values never pass through here; they are always bound.

use crate::error::{DbError, DbResult};

/// Characters allowed in column references: `users`, `posts.user_id`,
/// `` `order` `` (backtick-quoted names survive validation unchanged).
const COLUMN_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_.`";

/// Characters allowed in table names. No dots: qualified names are a
/// column-reference concept.
const TABLE_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_`";

/// Validate a column reference (optionally table-qualified).
pub fn validate_column(column: &str) -> DbResult<()> {
    if column.is_empty() {
        return Err(DbError::InvalidIdentifier("empty column name".to_string()));
    }
    for c in column.chars() {
        if !COLUMN_CHARS.contains(c) {
            return Err(DbError::InvalidIdentifier(format!(
                "column '{}' contains invalid character '{}'",
                column, c
            )));
        }
    }
    Ok(())
}

/// Validate a bare table name.
pub fn validate_table(table: &str) -> DbResult<()> {
    if table.is_empty() {
        return Err(DbError::InvalidIdentifier("empty table name".to_string()));
    }
    for c in table.chars() {
        if !TABLE_CHARS.contains(c) {
            return Err(DbError::InvalidIdentifier(format!(
                "table '{}' contains invalid character '{}'",
                table, c
            )));
        }
    }
    Ok(())
}

/// Backtick-quote a column name for INSERT/UPDATE column lists, so that
/// reserved words like `order` stay usable as columns.
pub fn escape_column(column: &str) -> String {
    format!("`{}`", column.trim_matches('`'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_column() {
        assert!(validate_column("title").is_ok());
        assert!(validate_column("posts.user_id").is_ok());
        assert!(validate_column("`order`").is_ok());
        assert!(validate_column("_private").is_ok());

        assert!(validate_column("").is_err());
        assert!(validate_column("a;DROP TABLE x").is_err());
        assert!(validate_column("name = 1 OR 1=1").is_err());
        assert!(validate_column("col-name").is_err());
    }

    #[test]
    fn test_validate_table() {
        assert!(validate_table("users").is_ok());
        assert!(validate_table("anon_posts").is_ok());

        assert!(validate_table("").is_err());
        assert!(validate_table("users; DROP TABLE users").is_err());
        // Qualified names are rejected for tables
        assert!(validate_table("db.users").is_err());
    }

    #[test]
    fn test_escape_column() {
        assert_eq!(escape_column("name"), "`name`");
        assert_eq!(escape_column("`order`"), "`order`");
    }
}
