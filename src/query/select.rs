//! Query builder SELECT operations.

use super::builder::QueryBuilder;
use crate::error::DbResult;
use crate::identifier::validate_column;

impl QueryBuilder {
    /// Add columns to the projection. The projection defaults to `*`
    /// when this is never called.
    pub fn select(mut self, columns: &[&str]) -> DbResult<Self> {
        for column in columns {
            if *column != "*" {
                validate_column(column)?;
            }
            self.selects.push((*column).to_string());
        }
        Ok(self)
    }
}
