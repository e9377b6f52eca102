//! mapgen - runtime support for generated entities and mappers
//!
//! `mapgen-codegen` turns table descriptions into entity, mapper and
//! repository source files. The generated code depends on this crate for:
//!
//! - **Values**: the dynamic [`Value`] enum with [`ToValue`] / [`FromValue`]
//! - **Rows**: [`Row`] and the [`FromRow`] / [`Entity`] traits
//! - **Query building**: [`QueryBuilder`] with named-placeholder binding
//! - **Execution**: the [`Executor`] seam, plus [`MySqlExecutor`] behind the
//!   `mysql` feature
//! - **Validation**: the [`validate`] entry point used by entity setters
//! - **Caching**: the [`Cache`] trait and an in-process [`MemoryCache`]
//!
//! # Example
//!
//! ```ignore
//! use mapgen::query::{Condition, QueryBuilder};
//!
//! async fn active_users(mapper: &UserMapper<MySqlExecutor>) -> mapgen::Result<Vec<User>> {
//!     let mut qb = mapper.query();
//!     qb.add_where(Condition::eq("status", "active"))?;
//!     mapper.select(&qb).await
//! }
//! ```

pub mod cache;
pub mod error;
pub mod mapper;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod query;
pub mod traits;
pub mod validator;
pub mod value;

// Generated repository traits are declared with `#[mapgen::async_trait]`.
pub use async_trait::async_trait;

pub use cache::{cache_key, Cache, MemoryCache};
pub use error::{Error, Result};
#[cfg(feature = "mysql")]
pub use mysql::MySqlExecutor;
pub use query::{BuiltQuery, Condition, Direction, Field, Join, JoinType, QueryBuilder, QueryKind};
pub use traits::{Entity, ExecuteResult, Executor, FromRow, FromValue, Row, ToValue};
pub use validator::{
    validate, IntegerPreset, ValidationError, ValidationOptions, Validator, ValidatorKind,
};
pub use value::Value;
