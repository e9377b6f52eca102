//! Error types for mapgen

use thiserror::Error;

use crate::validator::ValidationError;

/// Result type alias for mapgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the query builder, value conversions and executors
#[derive(Error, Debug)]
pub enum Error {
    /// MySQL driver error
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// `IN` / `NOT IN` predicate built over an empty list
    #[error("Empty value list for IN clause on field `{0}`")]
    EmptyInValues(String),

    /// INSERT/UPDATE rendered without any SET assignment
    #[error("Empty SET clause: no field to write")]
    EmptySetClause,

    /// WHERE clause required but no predicate was added
    #[error("Empty WHERE clause: refusing to run an unconstrained query")]
    EmptyWhereClause,

    /// Inconsistent builder state at render time
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A field value failed its declared constraint
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Type conversion error
    #[error("Type conversion error: expected {expected}, got {actual}")]
    TypeConversion {
        expected: &'static str,
        actual: String,
    },

    /// Column not found in row
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Null value for non-optional field
    #[error("Unexpected null value for column: {0}")]
    UnexpectedNull(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(String),
}
