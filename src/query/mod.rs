//! Fluent SQL query builder.
//!
//! Split across focused modules, all implementing methods on the one
//! [`QueryBuilder`] type:
//! - `builder` - builder state and construction
//! - `types` - the condition model and clause enums
//! - `where_clause` - WHERE tree construction
//! - `select` / `joins` / `ordering` - remaining read clauses
//! - `sql_generation` - compilation to SQL text plus ordered bindings
//! - `execution` - terminal read operations
//! - `dml` - INSERT / UPDATE / DELETE
//! - `pagination` - LIMIT/OFFSET pages and cursor pages

pub mod builder;
pub mod dml;
pub mod execution;
pub mod joins;
pub mod ordering;
pub mod pagination;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use pagination::CursorPage;
pub use types::{BoolOp, JoinKind, JoinSpec, Operator, OrderDirection, WhereNode};
