//! Fixed SQL vocabularies: comparison operators, concatenators, directions,
//! join types

use std::fmt;

/// Comparison operators accepted in WHERE and HAVING predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    /// `<>`, the ANSI spelling of `!=`
    Diff,
    Gt,
    Gte,
    Lt,
    Lte,
    /// `<=>`, MySQL's NULL-safe equality
    NullSafeEq,
    Like,
    Regexp,
    Is,
    IsNot,
}

impl Operator {
    /// SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Diff => "<>",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::NullSafeEq => "<=>",
            Operator::Like => "LIKE",
            Operator::Regexp => "REGEXP",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
        }
    }

    /// Parse the SQL spelling (case-insensitive for keyword operators).
    pub fn parse(op: &str) -> Option<Self> {
        let op = op.trim().to_ascii_uppercase();
        Some(match op.as_str() {
            "=" => Operator::Eq,
            "!=" => Operator::NotEq,
            "<>" => Operator::Diff,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "<=>" => Operator::NullSafeEq,
            "LIKE" => Operator::Like,
            "REGEXP" => Operator::Regexp,
            "IS" => Operator::Is,
            "IS NOT" => Operator::IsNot,
            _ => return None,
        })
    }

    /// `IS` / `IS NOT` only take literal operands.
    pub fn takes_literal(&self) -> bool {
        matches!(self, Operator::Is | Operator::IsNot)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// How a predicate attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concat {
    #[default]
    And,
    Or,
}

impl Concat {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Concat::And => "AND",
            Concat::Or => "OR",
        }
    }
}

/// Sort direction for ORDER BY terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Join flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
            JoinType::FullOuter => "FULL OUTER JOIN",
        }
    }

    /// Parse `inner`, `left`, `left outer`, `right`, `full`, ... (any case).
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        let name = name.strip_suffix(" join").unwrap_or(&name);
        match name {
            "inner" => Some(JoinType::Inner),
            "left" | "left outer" => Some(JoinType::LeftOuter),
            "right" | "right outer" => Some(JoinType::RightOuter),
            "full" | "full outer" => Some(JoinType::FullOuter),
            _ => None,
        }
    }

    /// Whether rows of the joined table may be missing from a result row.
    pub fn is_optional(&self) -> bool {
        !matches!(self, JoinType::Inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_round_trip() {
        for op in [
            Operator::Eq,
            Operator::NotEq,
            Operator::Diff,
            Operator::Gt,
            Operator::Gte,
            Operator::Lt,
            Operator::Lte,
            Operator::NullSafeEq,
            Operator::Like,
            Operator::Regexp,
            Operator::Is,
            Operator::IsNot,
        ] {
            assert_eq!(Operator::parse(op.as_sql()), Some(op));
        }
        assert_eq!(Operator::parse("is not"), Some(Operator::IsNot));
        assert_eq!(Operator::parse("BETWEEN"), None);
    }

    #[test]
    fn test_join_type_parse() {
        assert_eq!(JoinType::parse("LEFT"), Some(JoinType::LeftOuter));
        assert_eq!(JoinType::parse("left outer join"), Some(JoinType::LeftOuter));
        assert_eq!(JoinType::parse("inner"), Some(JoinType::Inner));
        assert_eq!(JoinType::parse("cross"), None);
    }
}
