//! FromValue trait for converting database values to Rust types

use std::fmt::Display;

use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

/// Trait for types that can be constructed from a database value.
///
/// Generated entities call this through the column type's cast expression,
/// e.g. `<u32 as mapgen::FromValue>::from_value(row.get_value("id")?)?`.
pub trait FromValue: Sized {
    /// Convert a database value to this type.
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::TypeConversion {
        expected,
        actual: value.type_name().to_string(),
    }
}

fn out_of_range(expected: &'static str, actual: impl Display) -> Error {
    Error::TypeConversion {
        expected,
        actual: format!("{} out of range", actual),
    }
}

// MySQL's text protocol hands integers back as strings and widens them to
// 64 bits, so every integer target accepts any integer variant in range.
macro_rules! integer_from_value {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Bool(v) => Ok(<$ty>::from(v)),
                        Value::String(ref s) => s
                            .trim()
                            .parse::<$ty>()
                            .map_err(|_| out_of_range($name, format!("{:?}", s))),
                        ref other => match other.as_i128() {
                            Some(v) => <$ty>::try_from(v).map_err(|_| out_of_range($name, v)),
                            None => Err(mismatch($name, other)),
                        },
                    }
                }
            }
        )*
    };
}

integer_from_value! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::String(ref s) => match s.as_str() {
                "0" => Ok(false),
                "1" => Ok(true),
                _ => Err(mismatch("bool", &value)),
            },
            ref other => other
                .as_i128()
                .map(|v| v != 0)
                .ok_or_else(|| mismatch("bool", other)),
        }
    }
}

// Native variants convert directly; text from the text protocol is parsed.
macro_rules! typed_or_text {
    ($($ty:ty => $name:literal { $($pat:pat => $conv:expr,)* } parse |$s:ident| $parse:expr;)*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        $($pat => Ok($conv),)*
                        Value::String(ref $s) => $parse.map_err(|_| mismatch($name, &value)),
                        other => Err(mismatch($name, &other)),
                    }
                }
            }
        )*
    };
}

typed_or_text! {
    f32 => "f32" { Value::F32(v) => v, Value::F64(v) => v as f32, }
        parse |s| s.trim().parse::<f32>();
    f64 => "f64" { Value::F32(v) => f64::from(v), Value::F64(v) => v, }
        parse |s| s.trim().parse::<f64>();
    NaiveDate => "date" { Value::Date(v) => v, Value::DateTime(v) => v.date(), }
        parse |s| NaiveDate::parse_from_str(s, "%Y-%m-%d");
    NaiveDateTime => "datetime" {
        Value::DateTime(v) => v,
        Value::Date(v) => NaiveDateTime::new(v, NaiveTime::MIN),
    }
        parse |s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f");
    NaiveTime => "time" { Value::Time(v) => v, Value::DateTime(v) => v.time(), }
        parse |s| NaiveTime::parse_from_str(s, "%H:%M:%S%.f");
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            Value::Bytes(v) => String::from_utf8(v).map_err(|e| Error::TypeConversion {
                expected: "utf8 string",
                actual: format!("invalid utf8: {}", e),
            }),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::String(v) => Ok(v.into_bytes()),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(v) => Ok(v),
            Value::I64(v) => Ok(Decimal::from(v)),
            Value::U64(v) => Ok(Decimal::from(v)),
            Value::String(v) => v.parse().map_err(|_| Error::TypeConversion {
                expected: "decimal",
                actual: format!("invalid decimal string: {}", v),
            }),
            other => Err(mismatch("decimal", &other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v),
            Value::String(v) => serde_json::from_str(&v).map_err(|e| Error::TypeConversion {
                expected: "json",
                actual: format!("invalid json: {}", e),
            }),
            other => Err(mismatch("json", &other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}
