//! MySQL column types and their Rust mapping

mod registry;
mod rust_type;

pub use registry::TypeRegistry;
pub use rust_type::RustType;

use std::fmt;

/// Storage kind of a column, one per MySQL base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Boolean,
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Char,
    VarChar,
    TinyText,
    Text,
    MediumText,
    LongText,
    Binary,
    VarBinary,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Bit,
    Date,
    DateTime,
    Timestamp,
    Time,
    Year,
    Enum,
    Set,
    Json,
}

impl ColumnKind {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnKind::TinyInt
                | ColumnKind::SmallInt
                | ColumnKind::MediumInt
                | ColumnKind::Int
                | ColumnKind::BigInt
                | ColumnKind::Year
        )
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            ColumnKind::Char
                | ColumnKind::VarChar
                | ColumnKind::TinyText
                | ColumnKind::Text
                | ColumnKind::MediumText
                | ColumnKind::LongText
                | ColumnKind::Enum
                | ColumnKind::Set
        )
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Boolean => "boolean",
            ColumnKind::TinyInt => "tinyint",
            ColumnKind::SmallInt => "smallint",
            ColumnKind::MediumInt => "mediumint",
            ColumnKind::Int => "int",
            ColumnKind::BigInt => "bigint",
            ColumnKind::Float => "float",
            ColumnKind::Double => "double",
            ColumnKind::Decimal => "decimal",
            ColumnKind::Char => "char",
            ColumnKind::VarChar => "varchar",
            ColumnKind::TinyText => "tinytext",
            ColumnKind::Text => "text",
            ColumnKind::MediumText => "mediumtext",
            ColumnKind::LongText => "longtext",
            ColumnKind::Binary => "binary",
            ColumnKind::VarBinary => "varbinary",
            ColumnKind::TinyBlob => "tinyblob",
            ColumnKind::Blob => "blob",
            ColumnKind::MediumBlob => "mediumblob",
            ColumnKind::LongBlob => "longblob",
            ColumnKind::Bit => "bit",
            ColumnKind::Date => "date",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Time => "time",
            ColumnKind::Year => "year",
            ColumnKind::Enum => "enum",
            ColumnKind::Set => "set",
            ColumnKind::Json => "json",
        };
        f.write_str(name)
    }
}

/// A parsed column type: kind plus the modifiers found in the raw
/// descriptor. Built by [`TypeRegistry::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    kind: ColumnKind,
    display_width: u32,
    scale: u32,
    is_unsigned: bool,
    other: Option<String>,
    values: Vec<String>,
}

impl ColumnType {
    pub(crate) fn new(kind: ColumnKind) -> Self {
        Self {
            kind,
            display_width: 0,
            scale: 0,
            is_unsigned: false,
            other: None,
            values: Vec::new(),
        }
    }

    pub(crate) fn with_width(mut self, width: u32, scale: u32) -> Self {
        self.display_width = width;
        self.scale = scale;
        self
    }

    pub(crate) fn with_unsigned(mut self, unsigned: bool) -> Self {
        self.is_unsigned = unsigned;
        self
    }

    pub(crate) fn with_other(mut self, other: Option<String>) -> Self {
        self.other = other;
        self
    }

    pub(crate) fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Display width or length; 0 when the descriptor gave none.
    pub fn display_width(&self) -> u32 {
        self.display_width
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_unsigned(&self) -> bool {
        self.is_unsigned
    }

    /// Trailing attribute other than `unsigned`, e.g. `zerofill`.
    pub fn other(&self) -> Option<&str> {
        self.other.as_deref()
    }

    /// Members of an `enum` or `set` column.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The Rust type of a NOT NULL column of this type.
    pub fn rust_type(&self) -> RustType {
        let unsigned = self.is_unsigned;
        match self.kind {
            ColumnKind::Boolean => RustType::Bool,
            ColumnKind::TinyInt => pick(unsigned, RustType::U8, RustType::I8),
            ColumnKind::SmallInt | ColumnKind::Year => pick(unsigned, RustType::U16, RustType::I16),
            ColumnKind::MediumInt | ColumnKind::Int => pick(unsigned, RustType::U32, RustType::I32),
            ColumnKind::BigInt => pick(unsigned, RustType::U64, RustType::I64),
            ColumnKind::Float => RustType::F32,
            ColumnKind::Double => RustType::F64,
            ColumnKind::Decimal => RustType::Decimal,
            ColumnKind::Char
            | ColumnKind::VarChar
            | ColumnKind::TinyText
            | ColumnKind::Text
            | ColumnKind::MediumText
            | ColumnKind::LongText
            | ColumnKind::Enum
            | ColumnKind::Set => RustType::String,
            ColumnKind::Binary
            | ColumnKind::VarBinary
            | ColumnKind::TinyBlob
            | ColumnKind::Blob
            | ColumnKind::MediumBlob
            | ColumnKind::LongBlob
            | ColumnKind::Bit => RustType::Bytes,
            ColumnKind::Date => RustType::NaiveDate,
            ColumnKind::DateTime | ColumnKind::Timestamp => RustType::NaiveDateTime,
            ColumnKind::Time => RustType::NaiveTime,
            ColumnKind::Json => RustType::Json,
        }
    }

    /// The Rust type of a column, wrapped in `Option` when nullable.
    pub fn rust_type_for(&self, nullable: bool) -> RustType {
        if nullable {
            self.rust_type().optional()
        } else {
            self.rust_type()
        }
    }

    /// Rust literal for the zero value of this type.
    pub fn empty_value(&self, nullable: bool) -> String {
        if nullable {
            return "None".to_string();
        }
        let literal = match self.rust_type() {
            RustType::Bool => "false",
            RustType::F32 | RustType::F64 => "0.0",
            RustType::Decimal => "rust_decimal::Decimal::ZERO",
            RustType::String => "String::new()",
            RustType::Bytes => "Vec::new()",
            RustType::NaiveDate | RustType::NaiveDateTime | RustType::NaiveTime => {
                "Default::default()"
            }
            RustType::Json => "serde_json::Value::Null",
            _ => "0",
        };
        literal.to_string()
    }

    /// Expression converting the `mapgen::Value` in `raw` into this type.
    ///
    /// The expression uses `?` and expects a `mapgen::Result` context.
    pub fn cast_expression(&self, raw: &str, nullable: bool) -> String {
        format!(
            "<{} as mapgen::FromValue>::from_value({})?",
            self.rust_type_for(nullable).to_type_string(),
            raw
        )
    }
}

fn pick(unsigned: bool, when_unsigned: RustType, when_signed: RustType) -> RustType {
    if unsigned {
        when_unsigned
    } else {
        when_signed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_types() {
        let bigint = ColumnType::new(ColumnKind::BigInt);
        assert_eq!(bigint.rust_type(), RustType::I64);
        assert_eq!(bigint.clone().with_unsigned(true).rust_type(), RustType::U64);
        assert_eq!(
            ColumnType::new(ColumnKind::Year).with_unsigned(true).rust_type(),
            RustType::U16
        );
        assert_eq!(ColumnType::new(ColumnKind::Enum).rust_type(), RustType::String);
        assert_eq!(ColumnType::new(ColumnKind::Bit).rust_type(), RustType::Bytes);
        assert_eq!(
            ColumnType::new(ColumnKind::Timestamp).rust_type(),
            RustType::NaiveDateTime
        );
    }

    #[test]
    fn test_empty_values() {
        assert_eq!(ColumnType::new(ColumnKind::Boolean).empty_value(false), "false");
        assert_eq!(ColumnType::new(ColumnKind::Int).empty_value(false), "0");
        assert_eq!(ColumnType::new(ColumnKind::Double).empty_value(false), "0.0");
        assert_eq!(
            ColumnType::new(ColumnKind::VarChar).empty_value(false),
            "String::new()"
        );
        assert_eq!(
            ColumnType::new(ColumnKind::Json).empty_value(false),
            "serde_json::Value::Null"
        );
        assert_eq!(ColumnType::new(ColumnKind::Int).empty_value(true), "None");
    }

    #[test]
    fn test_cast_expression() {
        let int = ColumnType::new(ColumnKind::Int).with_unsigned(true);
        assert_eq!(
            int.cast_expression("row.get_value(\"age\")?", false),
            "<u32 as mapgen::FromValue>::from_value(row.get_value(\"age\")?)?"
        );
        assert_eq!(
            ColumnType::new(ColumnKind::Text).cast_expression("raw", true),
            "<Option<String> as mapgen::FromValue>::from_value(raw)?"
        );
    }
}
