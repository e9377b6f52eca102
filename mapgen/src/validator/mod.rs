//! Field validators called from generated entity setters
//!
//! Each validator checks a [`Value`] against a [`ValidationOptions`] set and
//! returns the normalized value, or a [`ValidationError`] with a stable code.
//!
//! ```
//! use mapgen::{validate, ValidationOptions, ValidatorKind, Value};
//!
//! let options = ValidationOptions::new().min(1).max(10);
//! assert!(validate(ValidatorKind::Integer, &Value::I32(5), &options).is_ok());
//! assert!(validate(ValidatorKind::Integer, &Value::I32(11), &options).is_err());
//! ```

mod boolean;
mod domain;
mod email;
mod integer;
mod regexp;

use std::fmt;
use std::str::FromStr;

pub use boolean::BooleanValidator;
pub use domain::DomainValidator;
pub use email::EmailValidator;
pub use integer::IntegerValidator;
pub use regexp::RegexpValidator;

use crate::value::Value;

/// A value rejected by a validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed ({code}): {message}")]
pub struct ValidationError {
    pub code: u32,
    pub message: String,
}

impl ValidationError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A single validation rule.
pub trait Validator: Send + Sync {
    /// Stable error code reported by this validator.
    fn code(&self) -> u32;

    /// Check `value`, returning its normalized form.
    fn validate(
        &self,
        value: &Value,
        options: &ValidationOptions,
    ) -> Result<Value, ValidationError>;

    fn error(&self, message: impl Into<String>) -> ValidationError
    where
        Self: Sized,
    {
        ValidationError::new(self.code(), message)
    }
}

/// The built-in validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidatorKind {
    Boolean,
    Integer,
    Domain,
    Email,
    Regexp,
}

impl ValidatorKind {
    pub const ALL: [ValidatorKind; 5] = [
        ValidatorKind::Boolean,
        ValidatorKind::Integer,
        ValidatorKind::Domain,
        ValidatorKind::Email,
        ValidatorKind::Regexp,
    ];

    pub fn validator(&self) -> &'static dyn Validator {
        match self {
            ValidatorKind::Boolean => &BooleanValidator,
            ValidatorKind::Integer => &IntegerValidator,
            ValidatorKind::Domain => &DomainValidator,
            ValidatorKind::Email => &EmailValidator,
            ValidatorKind::Regexp => &RegexpValidator,
        }
    }

    pub fn code(&self) -> u32 {
        self.validator().code()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValidatorKind::Boolean => "boolean",
            ValidatorKind::Integer => "integer",
            ValidatorKind::Domain => "domain",
            ValidatorKind::Email => "email",
            ValidatorKind::Regexp => "regexp",
        }
    }
}

impl fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValidatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        ValidatorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| format!("unknown validator `{}`", s))
    }
}

/// Integer storage ranges usable instead of explicit `min`/`max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerPreset {
    TinyInt,
    TinyIntUnsigned,
    SmallInt,
    SmallIntUnsigned,
    MediumInt,
    MediumIntUnsigned,
    Int,
    IntUnsigned,
    BigInt,
    BigIntUnsigned,
}

impl IntegerPreset {
    pub const ALL: [IntegerPreset; 10] = [
        IntegerPreset::TinyInt,
        IntegerPreset::TinyIntUnsigned,
        IntegerPreset::SmallInt,
        IntegerPreset::SmallIntUnsigned,
        IntegerPreset::MediumInt,
        IntegerPreset::MediumIntUnsigned,
        IntegerPreset::Int,
        IntegerPreset::IntUnsigned,
        IntegerPreset::BigInt,
        IntegerPreset::BigIntUnsigned,
    ];

    /// Inclusive `(min, max)` of the storage type.
    pub fn range(&self) -> (i128, i128) {
        match self {
            IntegerPreset::TinyInt => (i8::MIN.into(), i8::MAX.into()),
            IntegerPreset::TinyIntUnsigned => (0, u8::MAX.into()),
            IntegerPreset::SmallInt => (i16::MIN.into(), i16::MAX.into()),
            IntegerPreset::SmallIntUnsigned => (0, u16::MAX.into()),
            IntegerPreset::MediumInt => (-8_388_608, 8_388_607),
            IntegerPreset::MediumIntUnsigned => (0, 16_777_215),
            IntegerPreset::Int => (i32::MIN.into(), i32::MAX.into()),
            IntegerPreset::IntUnsigned => (0, u32::MAX.into()),
            IntegerPreset::BigInt => (i64::MIN.into(), i64::MAX.into()),
            IntegerPreset::BigIntUnsigned => (0, u64::MAX.into()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IntegerPreset::TinyInt => "tinyint",
            IntegerPreset::TinyIntUnsigned => "tinyint_unsigned",
            IntegerPreset::SmallInt => "smallint",
            IntegerPreset::SmallIntUnsigned => "smallint_unsigned",
            IntegerPreset::MediumInt => "mediumint",
            IntegerPreset::MediumIntUnsigned => "mediumint_unsigned",
            IntegerPreset::Int => "int",
            IntegerPreset::IntUnsigned => "int_unsigned",
            IntegerPreset::BigInt => "bigint",
            IntegerPreset::BigIntUnsigned => "bigint_unsigned",
        }
    }

    /// Look a preset up by name; `integer` is accepted for `int`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace(' ', "_");
        let name = match name.as_str() {
            "integer" => "int",
            "integer_unsigned" => "int_unsigned",
            other => other,
        };
        IntegerPreset::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl FromStr for IntegerPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntegerPreset::from_name(s).ok_or_else(|| format!("unknown integer preset `{}`", s))
    }
}

/// Options shared by all validators; each one reads the fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub min: Option<i128>,
    pub max: Option<i128>,
    pub preset: Option<IntegerPreset>,
    pub pattern: Option<String>,
    pub hostname: bool,
    pub allow_null: bool,
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: impl Into<i128>) -> Self {
        self.min = Some(min.into());
        self
    }

    pub fn max(mut self, max: impl Into<i128>) -> Self {
        self.max = Some(max.into());
        self
    }

    pub fn preset(mut self, preset: IntegerPreset) -> Self {
        self.preset = Some(preset);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn hostname(mut self, hostname: bool) -> Self {
        self.hostname = hostname;
        self
    }

    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }
}

/// Run the `kind` validator over `value`.
///
/// NULL is accepted (and returned as is) only when `allow_null` is set.
pub fn validate(
    kind: ValidatorKind,
    value: &Value,
    options: &ValidationOptions,
) -> Result<Value, ValidationError> {
    if value.is_null() {
        return if options.allow_null {
            Ok(Value::Null)
        } else {
            Err(ValidationError::new(
                kind.code(),
                format!("{} value is required", kind),
            ))
        };
    }
    kind.validator().validate(value, options)
}
