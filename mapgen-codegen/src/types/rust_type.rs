//! Rust types emitted for columns

use std::fmt;

/// Field type of a generated entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RustType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Bytes,
    Decimal,
    NaiveDate,
    NaiveDateTime,
    NaiveTime,
    Json,
    /// Nullable column
    Option(Box<RustType>),
}

impl RustType {
    pub fn optional(self) -> Self {
        match self {
            RustType::Option(_) => self,
            other => RustType::Option(Box::new(other)),
        }
    }

    /// Path of a non-optional type as written in generated code.
    fn path(&self) -> &'static str {
        match self {
            RustType::Bool => "bool",
            RustType::I8 => "i8",
            RustType::I16 => "i16",
            RustType::I32 => "i32",
            RustType::I64 => "i64",
            RustType::U8 => "u8",
            RustType::U16 => "u16",
            RustType::U32 => "u32",
            RustType::U64 => "u64",
            RustType::F32 => "f32",
            RustType::F64 => "f64",
            RustType::String => "String",
            RustType::Bytes => "Vec<u8>",
            RustType::Decimal => "rust_decimal::Decimal",
            RustType::NaiveDate => "chrono::NaiveDate",
            RustType::NaiveDateTime => "chrono::NaiveDateTime",
            RustType::NaiveTime => "chrono::NaiveTime",
            RustType::Json => "serde_json::Value",
            RustType::Option(inner) => inner.path(),
        }
    }

    /// Borrowed form of owned buffer types (`String` -> `str`).
    fn borrowed(&self) -> Option<&'static str> {
        match self {
            RustType::String => Some("str"),
            RustType::Bytes => Some("[u8]"),
            RustType::Json => Some("serde_json::Value"),
            _ => None,
        }
    }

    pub fn to_type_string(&self) -> String {
        self.to_string()
    }

    /// Type of a lookup parameter: strings and bytes are taken by reference.
    pub fn to_param_type_string(&self) -> String {
        match (self, self.inner_type()) {
            (RustType::Option(_), RustType::String | RustType::Bytes) => {
                format!("Option<&{}>", self.inner_type().borrowed().unwrap_or_default())
            }
            (_, RustType::String | RustType::Bytes) => {
                format!("&{}", self.borrowed().unwrap_or_default())
            }
            _ => self.to_string(),
        }
    }

    /// Return type of a getter reading `self.<field>`, and the expression
    /// producing it. Buffers are lent out, everything else is copied.
    pub fn getter(&self, field: &str) -> (String, String) {
        let access = format!("self.{}", field);
        match (self, self.inner_type().borrowed()) {
            (RustType::Option(inner), Some(borrowed)) => {
                let adapter = if **inner == RustType::Json {
                    "as_ref"
                } else {
                    "as_deref"
                };
                (
                    format!("Option<&{}>", borrowed),
                    format!("{}.{}()", access, adapter),
                )
            }
            (_, Some(borrowed)) => (format!("&{}", borrowed), format!("&{}", access)),
            _ => (self.to_string(), access),
        }
    }

    pub fn inner_type(&self) -> &RustType {
        match self {
            RustType::Option(inner) => inner,
            _ => self,
        }
    }

    /// Whether this is a (possibly optional) integer
    pub fn is_integer(&self) -> bool {
        matches!(
            self.inner_type(),
            RustType::I8
                | RustType::I16
                | RustType::I32
                | RustType::I64
                | RustType::U8
                | RustType::U16
                | RustType::U32
                | RustType::U64
        )
    }
}

impl fmt::Display for RustType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RustType::Option(inner) => write!(f, "Option<{}>", inner),
            other => f.write_str(other.path()),
        }
    }
}
