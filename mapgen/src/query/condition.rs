//! WHERE / HAVING predicates

use super::bind::Bindings;
use super::ident::{escape_identifier, qualified};
use super::operator::{Concat, Operator};
use crate::error::{Error, Result};
use crate::traits::ToValue;
use crate::value::Value;

/// A predicate to add to a WHERE or HAVING clause.
///
/// ```
/// use mapgen::query::{Condition, Operator};
///
/// let c = Condition::new("age", Operator::Gte, 18).or().prefix("u");
/// # let _ = c;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: String,
    prefix: Option<String>,
    concat: Concat,
    test: Test,
}

#[derive(Debug, Clone, PartialEq)]
enum Test {
    Compare(Operator, Value),
    In { values: Vec<Value>, negated: bool },
}

impl Condition {
    /// `field <op> value`
    pub fn new<T: ToValue>(field: impl Into<String>, op: Operator, value: T) -> Self {
        Self {
            field: field.into(),
            prefix: None,
            concat: Concat::And,
            test: Test::Compare(op, value.to_value()),
        }
    }

    /// `field = value`
    pub fn eq<T: ToValue>(field: impl Into<String>, value: T) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// `field IN (values...)`
    pub fn is_in<I, T>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        Self {
            field: field.into(),
            prefix: None,
            concat: Concat::And,
            test: Test::In {
                values: values.into_iter().map(|v| v.to_value()).collect(),
                negated: false,
            },
        }
    }

    /// `field NOT IN (values...)`
    pub fn not_in<I, T>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        let mut condition = Self::is_in(field, values);
        condition.test = match condition.test {
            Test::In { values, .. } => Test::In {
                values,
                negated: true,
            },
            other => other,
        };
        condition
    }

    /// Attach with OR instead of AND.
    pub fn or(mut self) -> Self {
        self.concat = Concat::Or;
        self
    }

    /// Attach with the given concatenator.
    pub fn concat(mut self, concat: Concat) -> Self {
        self.concat = concat;
        self
    }

    /// Qualify the field with a table name or alias.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Bind the condition's values and turn it into a renderable predicate.
    pub(crate) fn into_predicate(self, bindings: &mut Bindings) -> Result<Predicate> {
        let field = qualified(self.prefix.as_deref(), &self.field);
        let column = escape_identifier(&field);
        let expr = match self.test {
            Test::Compare(op, value) if op.takes_literal() => {
                let literal = match value {
                    Value::Null => "NULL",
                    Value::Bool(true) => "TRUE",
                    Value::Bool(false) => "FALSE",
                    other => {
                        return Err(Error::InvalidQuery(format!(
                            "`{} {}` only accepts NULL or a boolean, got {}",
                            field,
                            op,
                            other.type_name()
                        )))
                    }
                };
                Expr::Literal {
                    column,
                    op,
                    literal,
                }
            }
            Test::Compare(op, value) => Expr::Compare {
                column,
                op,
                placeholder: bindings.bind(&field, value, true),
            },
            Test::In { values, negated } => {
                if values.is_empty() {
                    return Err(Error::EmptyInValues(field));
                }
                let placeholders = values
                    .into_iter()
                    .map(|value| bindings.bind(&field, value, true))
                    .collect();
                Expr::In {
                    column,
                    negated,
                    placeholders,
                }
            }
        };
        Ok(Predicate {
            concat: self.concat,
            expr,
        })
    }
}

/// A bound predicate, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Predicate {
    pub(crate) concat: Concat,
    pub(crate) expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Compare {
        column: String,
        op: Operator,
        placeholder: String,
    },
    Literal {
        column: String,
        op: Operator,
        literal: &'static str,
    },
    In {
        column: String,
        negated: bool,
        placeholders: Vec<String>,
    },
    Raw(String),
    /// Rows matching any of the keys; each key is an AND of equalities.
    AnyKey(Vec<Vec<(String, String)>>),
}

impl Expr {
    pub(crate) fn render(&self) -> String {
        match self {
            Expr::Compare {
                column,
                op,
                placeholder,
            } => format!("{} {} :{}", column, op, placeholder),
            Expr::Literal {
                column,
                op,
                literal,
            } => format!("{} {} {}", column, op, literal),
            Expr::In {
                column,
                negated,
                placeholders,
            } => format!(
                "{} {}IN ({})",
                column,
                if *negated { "NOT " } else { "" },
                placeholders
                    .iter()
                    .map(|p| format!(":{}", p))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Expr::Raw(fragment) => format!("({})", fragment),
            Expr::AnyKey(keys) => {
                let alternatives = keys
                    .iter()
                    .map(|key| {
                        let terms = key
                            .iter()
                            .map(|(column, placeholder)| format!("{} = :{}", column, placeholder))
                            .collect::<Vec<_>>();
                        if terms.len() == 1 {
                            terms.join("")
                        } else {
                            format!("({})", terms.join(" AND "))
                        }
                    })
                    .collect::<Vec<_>>();
                format!("({})", alternatives.join(" OR "))
            }
        }
    }

    pub(crate) fn placeholders(&self) -> Vec<&str> {
        match self {
            Expr::Compare { placeholder, .. } => vec![placeholder.as_str()],
            Expr::In { placeholders, .. } => placeholders.iter().map(String::as_str).collect(),
            Expr::AnyKey(keys) => keys
                .iter()
                .flat_map(|key| key.iter().map(|(_, p)| p.as_str()))
                .collect(),
            Expr::Literal { .. } | Expr::Raw(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_binds_value() {
        let mut binds = Bindings::new();
        let predicate = Condition::new("age", Operator::Gt, 18)
            .prefix("u")
            .into_predicate(&mut binds)
            .unwrap();
        assert_eq!(predicate.expr.render(), "`u`.`age` > :u_age");
        assert_eq!(binds.get("u_age"), Some(&Value::I32(18)));
    }

    #[test]
    fn test_is_null_renders_literal() {
        let mut binds = Bindings::new();
        let predicate = Condition::new("deleted_at", Operator::IsNot, Value::Null)
            .into_predicate(&mut binds)
            .unwrap();
        assert_eq!(predicate.expr.render(), "`deleted_at` IS NOT NULL");
        assert!(binds.is_empty());
    }

    #[test]
    fn test_is_rejects_non_literal() {
        let mut binds = Bindings::new();
        let err = Condition::new("name", Operator::Is, "x")
            .into_predicate(&mut binds)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn test_empty_in_fails() {
        let mut binds = Bindings::new();
        let err = Condition::not_in("id", Vec::<i32>::new())
            .into_predicate(&mut binds)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyInValues(field) if field == "id"));
    }
}
