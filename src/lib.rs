//! Database core for the Anon CMS.
//!
//! Two pieces:
//! - [`QueryBuilder`]: a fluent builder that compiles to SQL text with
//!   `?` placeholders plus an ordered binding list. Values are always
//!   parameter-bound; identifiers are allow-list validated before any
//!   SQL text exists.
//! - [`EagerLoader`]: batched relation loading that turns an N+1 query
//!   pattern into one `WHERE fk IN (...)` query per relation, with a
//!   per-loader result cache.
//!
//! Execution goes through the [`Connection`] trait; [`MySqlAdapter`] is
//! the sqlx-backed implementation.
//!
//! ```ignore
//! let conn = MySqlAdapter::connect(&url, PoolConfig::default()).await?;
//! let posts = QueryBuilder::table("posts")?
//!     .where_eq("status", "publish")?
//!     .order_by_desc("created_at")?
//!     .limit(10)
//!     .get(&conn)
//!     .await?;
//! ```

pub mod connection;
pub mod error;
pub mod identifier;
pub mod loading;
pub mod query;

#[cfg(test)]
pub(crate) mod test_support;

pub use connection::{Connection, MySqlAdapter, PoolConfig, Row, Statement};
pub use error::{DbError, DbResult};
pub use loading::EagerLoader;
pub use query::{CursorPage, JoinKind, OrderDirection, QueryBuilder};
