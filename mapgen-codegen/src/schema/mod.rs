//! Table descriptions: where column lists come from

mod ddl;
mod live;

pub use ddl::DdlSchema;
pub use live::LiveSchema;

use std::fmt;

use crate::error::Result;

/// Index role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Unique,
}

impl KeyRole {
    /// Parse the `Key` column of `SHOW COLUMNS` (`PRI`, `UNI`, `MUL`, ``).
    pub fn from_show_columns(key: &str) -> Self {
        match key.trim().to_ascii_uppercase().as_str() {
            "PRI" => KeyRole::Primary,
            "UNI" => KeyRole::Unique,
            _ => KeyRole::None,
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::None => f.write_str(""),
            KeyRole::Primary => f.write_str("PRI"),
            KeyRole::Unique => f.write_str("UNI"),
        }
    }
}

/// One column as described by a schema source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub field: String,
    /// Type as written in the schema, e.g. `int(10) unsigned`.
    pub raw_type: String,
    pub nullable: bool,
    pub key: KeyRole,
    pub default: Option<String>,
    /// Extra attributes, e.g. `auto_increment`.
    pub extra: String,
}

impl ColumnDescriptor {
    pub fn new(field: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            raw_type: raw_type.into(),
            nullable: false,
            key: KeyRole::None,
            default: None,
            extra: String::new(),
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn key(mut self, key: KeyRole) -> Self {
        self.key = key;
        self
    }

    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    pub fn is_primary(&self) -> bool {
        self.key == KeyRole::Primary
    }

    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }
}

/// Describes tables by name.
pub trait SchemaSource {
    /// Columns of `table` in declaration order; `MissingTable` when the
    /// source does not know the table.
    fn describe(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;
}

impl<S: SchemaSource + ?Sized> SchemaSource for &S {
    fn describe(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        (**self).describe(table)
    }
}
