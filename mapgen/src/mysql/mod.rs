//! MySQL executor for generated mappers

mod executor;
mod row;
mod types;

pub use executor::MySqlExecutor;
pub use row::from_mysql_row;
pub use types::{from_mysql_value, to_mysql_params, to_mysql_value};
