//! Query builder pagination: LIMIT/OFFSET pages and cursor pages.

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::{Operator, OrderDirection};
use crate::connection::{Connection, Row};
use crate::error::DbResult;
use crate::identifier::validate_column;

/// One page of a cursor-paginated result set.
///
/// `next_cursor` is the cursor-column value of the last returned row and
/// is only present when more rows exist past this page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CursorPage {
    pub data: Vec<Row>,
    pub next_cursor: Option<Value>,
    pub has_more: bool,
}

impl QueryBuilder {
    /// Set the LIMIT clause.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the OFFSET clause.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Classic page-numbered pagination. Pages are 1-based; page 0 is
    /// treated as page 1.
    pub fn paginate(self, per_page: u64, page: u64) -> Self {
        let page = page.max(1);
        self.limit(per_page).offset((page - 1) * per_page)
    }

    /// Keyset pagination over a monotonically increasing column,
    /// ascending. `cursor` is the column value of the last row of the
    /// previous page; `None` starts from the beginning.
    pub async fn cursor_paginate(
        self,
        conn: &dyn Connection,
        limit: u64,
        cursor: Option<Value>,
        cursor_column: &str,
    ) -> DbResult<CursorPage> {
        self.cursor_page(conn, limit, cursor, cursor_column, OrderDirection::Asc)
            .await
    }

    /// Keyset pagination over a timestamp column, newest first. `cursor`
    /// is the timestamp of the last row of the previous page.
    pub async fn cursor_paginate_by_time(
        self,
        conn: &dyn Connection,
        limit: u64,
        cursor: Option<Value>,
        time_column: &str,
    ) -> DbResult<CursorPage> {
        self.cursor_page(conn, limit, cursor, time_column, OrderDirection::Desc)
            .await
    }

    async fn cursor_page(
        mut self,
        conn: &dyn Connection,
        limit: u64,
        cursor: Option<Value>,
        column: &str,
        direction: OrderDirection,
    ) -> DbResult<CursorPage> {
        validate_column(column)?;

        if let Some(cursor) = cursor {
            let operator = match direction {
                OrderDirection::Asc => Operator::GreaterThan,
                OrderDirection::Desc => Operator::LessThan,
            };
            self = self.where_op(column, &operator.to_string(), cursor)?;
        }

        // The cursor column must drive the ordering or the keyset breaks
        if !self.orders.iter().any(|(c, _)| c == column) {
            self = self.order_by_direction(column, direction)?;
        }

        // Over-fetch one row to learn whether another page exists
        self.limit = Some(limit + 1);
        self.offset = None;
        let mut rows = self.get(conn).await?;

        let has_more = rows.len() as u64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }

        let next_cursor = if has_more {
            rows.last().and_then(|r| r.get(column)).cloned()
        } else {
            None
        };

        Ok(CursorPage {
            data: rows,
            next_cursor,
            has_more,
        })
    }
}
