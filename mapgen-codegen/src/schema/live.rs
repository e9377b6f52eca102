//! Schema source that introspects a running database

use mapgen::query::escape_identifier;
use mapgen::{BuiltQuery, Executor, Row};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use super::{ColumnDescriptor, KeyRole, SchemaSource};
use crate::error::{CodegenError, Result};

/// Describes tables with `SHOW COLUMNS FROM`, run through any executor.
///
/// The executor is async; queries run on a private current-thread runtime,
/// so this must not be used from inside another tokio runtime.
pub struct LiveSchema<E: Executor> {
    executor: E,
    runtime: Runtime,
}

impl<E: Executor> LiveSchema<E> {
    pub fn new(executor: E) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { executor, runtime })
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}

#[cfg(feature = "mysql")]
impl LiveSchema<mapgen::MySqlExecutor> {
    /// Open a MySQL connection pool on the private runtime.
    pub fn connect(url: &str) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let executor = {
            let _guard = runtime.enter();
            mapgen::MySqlExecutor::new(url)?
        };
        Ok(Self { executor, runtime })
    }
}

impl<E: Executor> SchemaSource for LiveSchema<E> {
    fn describe(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let query = BuiltQuery::new(format!("SHOW COLUMNS FROM {}", escape_identifier(table)));
        let rows = self.runtime.block_on(self.executor.fetch_all(&query))?;

        let mut columns = Vec::with_capacity(rows.len());
        // the end of the row set is the end of the table
        for row in rows.iter() {
            columns.push(describe_row(row)?);
        }
        if columns.is_empty() {
            return Err(CodegenError::MissingTable(table.to_string()));
        }
        debug!("Described table {} ({} columns)", table, columns.len());
        Ok(columns)
    }
}

/// One `SHOW COLUMNS` row: Field, Type, Null, Key, Default, Extra.
fn describe_row(row: &Row) -> Result<ColumnDescriptor> {
    let field: String = row.get("Field")?;
    let raw_type: String = row.get("Type")?;
    let null: String = row.get("Null")?;
    let key: Option<String> = row.get("Key")?;
    let default: Option<String> = row.get("Default")?;
    let extra: Option<String> = row.get("Extra")?;

    Ok(ColumnDescriptor {
        field,
        raw_type,
        nullable: null.eq_ignore_ascii_case("YES"),
        key: KeyRole::from_show_columns(key.as_deref().unwrap_or_default()),
        default,
        extra: extra.unwrap_or_default(),
    })
}
