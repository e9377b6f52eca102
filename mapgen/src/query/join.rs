//! JOIN clauses

use super::ident::escape_identifier;
use super::operator::JoinType;

/// `{TYPE} JOIN table AS remote_alias ON local_alias.local_field = remote_alias.remote_field`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: String,
    pub local_field: String,
    pub local_alias: String,
    pub remote_field: String,
    pub remote_alias: String,
}

impl Join {
    pub fn new(
        join_type: JoinType,
        table: impl Into<String>,
        remote_alias: impl Into<String>,
    ) -> Self {
        let table = table.into();
        Self {
            join_type,
            local_field: String::new(),
            local_alias: String::new(),
            remote_field: String::new(),
            remote_alias: remote_alias.into(),
            table,
        }
    }

    /// Join on `local_alias.local_field = remote_alias.remote_field`.
    pub fn on(
        mut self,
        local_alias: impl Into<String>,
        local_field: impl Into<String>,
        remote_field: impl Into<String>,
    ) -> Self {
        self.local_alias = local_alias.into();
        self.local_field = local_field.into();
        self.remote_field = remote_field.into();
        self
    }

    pub fn render(&self) -> String {
        format!(
            "{} {} AS {} ON {}.{} = {}.{}",
            self.join_type.as_sql(),
            escape_identifier(&self.table),
            escape_identifier(&self.remote_alias),
            escape_identifier(&self.local_alias),
            escape_identifier(&self.local_field),
            escape_identifier(&self.remote_alias),
            escape_identifier(&self.remote_field),
        )
    }
}

/// Joins in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinClause {
    joins: Vec<Join>,
}

impl JoinClause {
    pub fn add(&mut self, join: Join) {
        self.joins.push(join);
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Join> {
        self.joins.iter()
    }

    /// Space-separated joins, empty when none were added.
    pub fn render(&self) -> String {
        self.joins
            .iter()
            .map(Join::render)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn clear(&mut self) {
        self.joins.clear();
    }
}
