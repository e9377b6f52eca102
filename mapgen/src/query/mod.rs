//! Query builder used by generated mappers
//!
//! A [`QueryBuilder`] accumulates clauses as small structures and renders
//! them on demand. Literal values never reach the SQL text: every value is
//! bound to a named placeholder (`:field`, `:field_1`, ...) and travels in the
//! bind list of the [`BuiltQuery`].
//!
//! # Example
//!
//! ```
//! use mapgen::query::{Condition, Direction, QueryBuilder, QueryKind};
//!
//! let mut qb = QueryBuilder::new();
//! qb.set_from("user", None);
//! qb.add_where(Condition::eq("status", "active"))?;
//! qb.add_in("id", [1, 2, 3])?;
//! qb.add_order("created_at", Direction::Desc);
//! qb.set_limit(10, None);
//!
//! let query = qb.build(QueryKind::Select)?;
//! assert_eq!(
//!     query.sql,
//!     "SELECT * FROM `user` WHERE `status` = :status AND `id` IN (:id, :id_1, :id_2) \
//!      ORDER BY `created_at` DESC LIMIT 10"
//! );
//! assert_eq!(query.params.len(), 4);
//! # Ok::<(), mapgen::Error>(())
//! ```

mod bind;
mod builder;
mod clauses;
mod condition;
mod fields;
mod ident;
mod join;
mod operator;

pub use bind::{Binding, Bindings};
pub use builder::QueryBuilder;
pub use clauses::{GroupClause, LimitClause, OrderClause, SetClause, WhereClause};
pub use condition::Condition;
pub use fields::{Field, FieldList};
pub use ident::escape_identifier;
pub use join::{Join, JoinClause};
pub use operator::{Concat, Direction, JoinType, Operator};

use crate::traits::ToValue;
use crate::value::Value;

/// Statement shapes the builder can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// `SELECT fields FROM ... [JOIN] [WHERE] [GROUP BY] [HAVING] [ORDER BY] [LIMIT]`
    Select,
    /// `SELECT COUNT(*) AS count FROM ... [JOIN] [WHERE]`
    Count,
    /// `INSERT INTO table SET ... [ON DUPLICATE KEY UPDATE ...]`
    Insert,
    /// `UPDATE table SET ... WHERE ... [ORDER BY] [LIMIT]`; WHERE is mandatory
    Update,
    /// `DELETE FROM table WHERE ... [ORDER BY] [LIMIT]`; WHERE is mandatory
    Delete,
}

/// A rendered statement: SQL text with named placeholders plus the values
/// bound to them, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<(String, Value)>,
}

impl BuiltQuery {
    /// Wrap a hand-written statement.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind a value to a placeholder used in the hand-written SQL.
    pub fn bind<T: ToValue>(mut self, name: impl Into<String>, value: T) -> Self {
        self.params.push((name.into(), value.to_value()));
        self
    }

    /// Look up the value bound to `name`.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Bound values without their names.
    pub fn values(&self) -> Vec<Value> {
        self.params.iter().map(|(_, v)| v.clone()).collect()
    }
}
