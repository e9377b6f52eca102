//! Raw type descriptor parsing

use std::sync::OnceLock;

use regex::Regex;

use super::{ColumnKind, ColumnType};
use crate::error::{CodegenError, Result};

/// Base type names, lower-cased, and the kind each one selects.
const KINDS: &[(&str, ColumnKind)] = &[
    ("bool", ColumnKind::Boolean),
    ("boolean", ColumnKind::Boolean),
    ("tinyint", ColumnKind::TinyInt),
    ("smallint", ColumnKind::SmallInt),
    ("mediumint", ColumnKind::MediumInt),
    ("int", ColumnKind::Int),
    ("integer", ColumnKind::Int),
    ("bigint", ColumnKind::BigInt),
    ("float", ColumnKind::Float),
    ("double", ColumnKind::Double),
    ("real", ColumnKind::Double),
    ("decimal", ColumnKind::Decimal),
    ("numeric", ColumnKind::Decimal),
    ("dec", ColumnKind::Decimal),
    ("fixed", ColumnKind::Decimal),
    ("char", ColumnKind::Char),
    ("varchar", ColumnKind::VarChar),
    ("tinytext", ColumnKind::TinyText),
    ("text", ColumnKind::Text),
    ("mediumtext", ColumnKind::MediumText),
    ("longtext", ColumnKind::LongText),
    ("binary", ColumnKind::Binary),
    ("varbinary", ColumnKind::VarBinary),
    ("tinyblob", ColumnKind::TinyBlob),
    ("blob", ColumnKind::Blob),
    ("mediumblob", ColumnKind::MediumBlob),
    ("longblob", ColumnKind::LongBlob),
    ("bit", ColumnKind::Bit),
    ("date", ColumnKind::Date),
    ("datetime", ColumnKind::DateTime),
    ("timestamp", ColumnKind::Timestamp),
    ("time", ColumnKind::Time),
    ("year", ColumnKind::Year),
    ("enum", ColumnKind::Enum),
    ("set", ColumnKind::Set),
    ("json", ColumnKind::Json),
];

fn descriptor_re() -> Option<&'static Regex> {
    static DESCRIPTOR_RE: OnceLock<Option<Regex>> = OnceLock::new();
    DESCRIPTOR_RE
        .get_or_init(|| Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_]*)\s*(?:\((.*)\))?\s*(.*?)\s*$").ok())
        .as_ref()
}

/// Maps raw MySQL type descriptors (`int(10) unsigned`, `enum('a','b')`,
/// `DECIMAL(10,2)`) to [`ColumnType`]s.
pub struct TypeRegistry;

impl TypeRegistry {
    /// Parse a raw descriptor.
    ///
    /// Fails with `InvalidSqlType` when nothing in `raw` looks like a type
    /// and with `UnknownSqlType` when the base name is not supported.
    pub fn resolve(raw: &str) -> Result<ColumnType> {
        let invalid = || CodegenError::InvalidSqlType(raw.to_string());
        let captures = descriptor_re()
            .and_then(|re| re.captures(raw))
            .ok_or_else(invalid)?;

        let base = captures
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .ok_or_else(invalid)?;
        let kind = Self::kind_of(&base).ok_or_else(|| CodegenError::UnknownSqlType(base.clone()))?;

        let mut column_type = ColumnType::new(kind);
        if let Some(args) = captures.get(2).map(|m| m.as_str().trim()) {
            if args.starts_with('\'') || args.starts_with('"') {
                column_type = column_type.with_values(parse_members(args).ok_or_else(invalid)?);
            } else if !args.is_empty() {
                let (width, scale) = parse_width(args).ok_or_else(invalid)?;
                column_type = column_type.with_width(width, scale);
            }
        }

        let mut unsigned = false;
        let mut other = Vec::new();
        for token in captures
            .get(3)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split_whitespace()
        {
            if token.eq_ignore_ascii_case("unsigned") {
                unsigned = true;
            } else {
                other.push(token);
            }
        }
        let other = (!other.is_empty()).then(|| other.join(" "));
        column_type = column_type.with_unsigned(unsigned).with_other(other);

        if kind == ColumnKind::TinyInt && column_type.display_width() == 1 {
            column_type = ColumnType::new(ColumnKind::Boolean)
                .with_width(1, 0)
                .with_unsigned(unsigned)
                .with_other(column_type.other().map(str::to_string));
        }
        Ok(column_type)
    }

    /// Kind selected by a lower-case base type name.
    pub fn kind_of(base: &str) -> Option<ColumnKind> {
        KINDS
            .iter()
            .find(|(name, _)| *name == base)
            .map(|(_, kind)| *kind)
    }

    /// Every supported base type name.
    pub fn base_names() -> impl Iterator<Item = &'static str> {
        KINDS.iter().map(|(name, _)| *name)
    }
}

/// `10` or `10,2`.
fn parse_width(args: &str) -> Option<(u32, u32)> {
    match args.split_once(',') {
        Some((width, scale)) => Some((width.trim().parse().ok()?, scale.trim().parse().ok()?)),
        None => Some((args.parse().ok()?, 0)),
    }
}

/// `'a','b'` with `''` (or doubled `"`) escaping a quote inside a member.
fn parse_members(args: &str) -> Option<Vec<String>> {
    let mut members = Vec::new();
    let mut chars = args.chars().peekable();
    loop {
        while chars.peek().map_or(false, |c| c.is_whitespace()) {
            chars.next();
        }
        let quote = chars.next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        let mut member = String::new();
        loop {
            let c = chars.next()?;
            if c == quote {
                if chars.peek() == Some(&quote) {
                    chars.next();
                    member.push(quote);
                } else {
                    break;
                }
            } else {
                member.push(c);
            }
        }
        members.push(member);

        while chars.peek().map_or(false, |c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => return Some(members),
            Some(',') => continue,
            Some(_) => return None,
        }
    }
}
