//! Core traits for mapgen

mod entity;
mod executor;
mod from_value;
mod row;
mod to_value;

pub use entity::Entity;
pub use executor::{ExecuteResult, Executor, FOUND_ROWS_COLUMN, FOUND_ROWS_SQL};
pub use from_value::FromValue;
pub use row::{FromRow, Row};
pub use to_value::ToValue;
