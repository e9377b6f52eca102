//! mysql_async rows to mapgen rows

use mysql_async::Row as MySqlAsyncRow;

use super::types::from_mysql_value;
use crate::error::{Error, Result};
use crate::traits::Row;

/// Convert a driver row, keeping the column order of the result set.
pub fn from_mysql_row(row: MySqlAsyncRow) -> Result<Row> {
    let columns = row.columns_ref();
    let mut converted = Row::new();

    for (i, column) in columns.iter().enumerate() {
        let column_name = column.name_str().to_string();
        let mysql_value = row
            .as_ref(i)
            .ok_or_else(|| Error::ColumnNotFound(column_name.clone()))?
            .clone();
        converted.push(column_name, from_mysql_value(mysql_value)?);
    }

    Ok(converted)
}
