//! Executor trait: the seam between rendered queries and a database driver

use std::sync::Arc;

use crate::error::Result;
use crate::query::BuiltQuery;
use crate::traits::Row;
use async_trait::async_trait;

/// Result of a query execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteResult {
    /// Number of rows affected by the query
    pub rows_affected: u64,
    /// Last insert ID (for INSERT statements)
    pub last_insert_id: Option<u64>,
}

/// Runs rendered queries.
///
/// Generated mappers are generic over this trait, so the same mapper code
/// works with the MySQL executor, a transaction wrapper, or a test double.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a statement and return the number of affected rows.
    async fn execute(&self, query: &BuiltQuery) -> Result<ExecuteResult>;

    /// Fetch every row produced by the query.
    async fn fetch_all(&self, query: &BuiltQuery) -> Result<Vec<Row>>;

    /// Fetch the first row, if any.
    async fn fetch_optional(&self, query: &BuiltQuery) -> Result<Option<Row>> {
        Ok(self.fetch_all(query).await?.into_iter().next())
    }

    /// Fetch the rows of a `SQL_CALC_FOUND_ROWS` select together with the
    /// `FOUND_ROWS()` total.
    ///
    /// Both statements must run on the same session. The default runs them
    /// back to back on `self`, which only holds for single-connection
    /// executors; pooled executors override it.
    async fn fetch_all_with_found_rows(&self, query: &BuiltQuery) -> Result<(Vec<Row>, u64)> {
        let rows = self.fetch_all(query).await?;
        let total = match self.fetch_optional(&BuiltQuery::new(FOUND_ROWS_SQL)).await? {
            Some(row) => row.get::<u64>(FOUND_ROWS_COLUMN)?,
            None => 0,
        };
        Ok((rows, total))
    }
}

/// Query reading the total of the session's last `SQL_CALC_FOUND_ROWS` select.
pub const FOUND_ROWS_SQL: &str = "SELECT FOUND_ROWS() AS `found_rows`";

/// Column name of [`FOUND_ROWS_SQL`]'s single result.
pub const FOUND_ROWS_COLUMN: &str = "found_rows";

#[async_trait]
impl<T: Executor + ?Sized> Executor for Arc<T> {
    async fn execute(&self, query: &BuiltQuery) -> Result<ExecuteResult> {
        (**self).execute(query).await
    }

    async fn fetch_all(&self, query: &BuiltQuery) -> Result<Vec<Row>> {
        (**self).fetch_all(query).await
    }

    async fn fetch_optional(&self, query: &BuiltQuery) -> Result<Option<Row>> {
        (**self).fetch_optional(query).await
    }

    async fn fetch_all_with_found_rows(&self, query: &BuiltQuery) -> Result<(Vec<Row>, u64)> {
        (**self).fetch_all_with_found_rows(query).await
    }
}

#[async_trait]
impl<T: Executor + ?Sized> Executor for &T {
    async fn execute(&self, query: &BuiltQuery) -> Result<ExecuteResult> {
        (**self).execute(query).await
    }

    async fn fetch_all(&self, query: &BuiltQuery) -> Result<Vec<Row>> {
        (**self).fetch_all(query).await
    }

    async fn fetch_optional(&self, query: &BuiltQuery) -> Result<Option<Row>> {
        (**self).fetch_optional(query).await
    }

    async fn fetch_all_with_found_rows(&self, query: &BuiltQuery) -> Result<(Vec<Row>, u64)> {
        (**self).fetch_all_with_found_rows(query).await
    }
}
