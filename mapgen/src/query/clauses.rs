//! WHERE / HAVING, ORDER BY, GROUP BY, LIMIT and SET clause structures
//!
//! Each clause renders its own keyword and returns an empty string when
//! nothing was added, so the builder can join the non-empty parts.

use super::condition::{Expr, Predicate};
use super::ident::escape_identifier;
use super::operator::Direction;

/// Predicates joined by their AND/OR concatenators. Used for both WHERE and
/// HAVING.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    predicates: Vec<Predicate>,
}

impl WhereClause {
    pub(crate) fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// The predicates without a keyword; the first concatenator is dropped.
    pub fn render_predicates(&self) -> String {
        let mut sql = String::new();
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(predicate.concat.as_sql());
                sql.push(' ');
            }
            sql.push_str(&predicate.expr.render());
        }
        sql
    }

    /// `{keyword} predicates`, or an empty string.
    pub fn render(&self, keyword: &str) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("{} {}", keyword, self.render_predicates())
        }
    }

    pub(crate) fn placeholders(&self) -> Vec<&str> {
        self.predicates
            .iter()
            .flat_map(|p| p.expr.placeholders())
            .collect()
    }

    /// Raw fragments, which may reference placeholders bound by hand.
    pub(crate) fn raw_fragments(&self) -> impl Iterator<Item = &str> {
        self.predicates.iter().filter_map(|p| match &p.expr {
            Expr::Raw(fragment) => Some(fragment.as_str()),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.predicates.clear();
    }
}

/// ORDER BY terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderClause {
    terms: Vec<(String, Direction)>,
}

impl OrderClause {
    pub fn add(&mut self, field: impl Into<String>, direction: Direction) {
        self.terms.push((field.into(), direction));
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn render(&self) -> String {
        if self.terms.is_empty() {
            return String::new();
        }
        let terms = self
            .terms
            .iter()
            .map(|(field, direction)| format!("{} {}", escape_identifier(field), direction.as_sql()))
            .collect::<Vec<_>>();
        format!("ORDER BY {}", terms.join(", "))
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }
}

/// GROUP BY terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupClause {
    fields: Vec<String>,
}

impl GroupClause {
    pub fn add(&mut self, field: impl Into<String>) {
        self.fields.push(field.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn render(&self) -> String {
        if self.fields.is_empty() {
            return String::new();
        }
        let fields = self
            .fields
            .iter()
            .map(|f| escape_identifier(f))
            .collect::<Vec<_>>();
        format!("GROUP BY {}", fields.join(", "))
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

/// LIMIT with an optional OFFSET.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitClause {
    limit: Option<u64>,
    offset: Option<u64>,
}

impl LimitClause {
    pub fn set(&mut self, limit: u64, offset: Option<u64>) {
        self.limit = Some(limit);
        self.offset = offset;
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn render(&self) -> String {
        match (self.limit, self.offset) {
            (None, _) => String::new(),
            (Some(limit), None) => format!("LIMIT {}", limit),
            (Some(limit), Some(offset)) => format!("LIMIT {} OFFSET {}", limit, offset),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// `field = :placeholder` assignments, one per field.
///
/// Used for SET as well as ON DUPLICATE KEY UPDATE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetClause {
    assignments: Vec<(String, String)>,
}

impl SetClause {
    /// Assign `placeholder` to `field`, replacing an earlier assignment.
    pub fn set(&mut self, field: impl Into<String>, placeholder: impl Into<String>) {
        let field = field.into();
        let placeholder = placeholder.into();
        match self.assignments.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = placeholder,
            None => self.assignments.push((field, placeholder)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Comma-separated assignments without a keyword.
    pub fn render(&self) -> String {
        self.assignments
            .iter()
            .map(|(field, placeholder)| format!("{} = :{}", escape_identifier(field), placeholder))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn placeholders(&self) -> Vec<&str> {
        self.assignments.iter().map(|(_, p)| p.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.assignments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_render() {
        let mut limit = LimitClause::default();
        assert_eq!(limit.render(), "");
        limit.set(10, None);
        assert_eq!(limit.render(), "LIMIT 10");
        limit.set(10, Some(20));
        assert_eq!(limit.render(), "LIMIT 10 OFFSET 20");
    }

    #[test]
    fn test_set_replaces_field() {
        let mut set = SetClause::default();
        set.set("name", "name");
        set.set("age", "age");
        set.set("name", "name_1");
        assert_eq!(set.len(), 2);
        assert_eq!(set.render(), "`name` = :name_1, `age` = :age");
    }

    #[test]
    fn test_order_and_group() {
        let mut order = OrderClause::default();
        order.add("name", Direction::Asc);
        order.add("u.created_at", Direction::Desc);
        assert_eq!(order.render(), "ORDER BY `name` ASC, `u`.`created_at` DESC");

        let mut group = GroupClause::default();
        assert_eq!(group.render(), "");
        group.add("status");
        assert_eq!(group.render(), "GROUP BY `status`");
    }
}
