//! Row container and the FromRow trait for mapping rows to entities

use crate::error::{Error, Result};
use crate::traits::FromValue;
use crate::value::Value;

/// A fetched database row: column names paired with dynamic values, in the
/// order the executor returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    /// Builder-style [`Row::push`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Get a value by column name.
    ///
    /// Returns an error if the column doesn't exist.
    pub fn get_value(&self, column: &str) -> Result<Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i].clone())
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))
    }

    /// Get a typed value by column name.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T> {
        T::from_value(self.get_value(column)?)
    }

    /// Whether the column is absent or NULL.
    pub fn is_null(&self, column: &str) -> bool {
        self.get_value(column).map_or(true, |v| v.is_null())
    }

    /// Sub-row of the columns starting with `prefix`, with the prefix removed.
    ///
    /// Joined tables are selected under `{alias}__{column}` aliases; this
    /// recovers a row the joined entity's `FromRow` can read.
    pub fn scoped(&self, prefix: &str) -> Row {
        let mut row = Row::new();
        for (column, value) in self.iter() {
            if let Some(stripped) = column.strip_prefix(prefix) {
                row.push(stripped, value.clone());
            }
        }
        row
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

/// Trait for types that can be constructed from a database row.
///
/// Generated entities implement this with one cast expression per column.
///
/// # Manual Implementation
///
/// ```ignore
/// use mapgen::{FromRow, Row, Result};
///
/// pub struct User {
///     pub id: i64,
///     pub username: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> Result<Self> {
///         Ok(Self {
///             id: row.get("id")?,
///             username: row.get("username")?,
///         })
///     }
///
///     fn column_names() -> &'static [&'static str] {
///         &["id", "username"]
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Construct an instance of this type from a database row.
    fn from_row(row: &Row) -> Result<Self>;

    /// Get the column names that this type reads from.
    ///
    /// This is used for building SELECT field lists.
    fn column_names() -> &'static [&'static str];
}
