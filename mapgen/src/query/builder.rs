//! The clause accumulator behind generated mappers

use super::bind::{Binding, Bindings};
use super::clauses::{GroupClause, LimitClause, OrderClause, SetClause, WhereClause};
use super::condition::{Condition, Expr, Predicate};
use super::fields::{Field, FieldList};
use super::ident::{escape_identifier, qualified};
use super::join::{Join, JoinClause};
use super::operator::{Concat, Direction};
use super::{BuiltQuery, QueryKind};
use crate::error::{Error, Result};
use crate::traits::ToValue;
use crate::value::Value;

/// Accumulates clauses and bound values, and renders them into statements.
///
/// Render methods take `&self` and may be called any number of times.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    fields: FieldList,
    from: Option<(String, Option<String>)>,
    wheres: WhereClause,
    joins: JoinClause,
    orders: OrderClause,
    groups: GroupClause,
    havings: WhereClause,
    limit: LimitClause,
    sets: SetClause,
    updates: SetClause,
    bindings: Bindings,
    list_index_field: Option<String>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Field selection ----

    pub fn add_field(&mut self, field: Field) -> &mut Self {
        self.fields.add(field);
        self
    }

    /// Set the FROM table, optionally under an alias.
    pub fn set_from(&mut self, table: impl Into<String>, alias: Option<&str>) -> &mut Self {
        self.from = Some((table.into(), alias.map(str::to_string)));
        self
    }

    /// Prefix the field list with `SQL_CALC_FOUND_ROWS`.
    pub fn set_calc_found_rows(&mut self, enabled: bool) -> &mut Self {
        self.fields.set_calc_found_rows(enabled);
        self
    }

    pub fn calc_found_rows(&self) -> bool {
        self.fields.calc_found_rows()
    }

    /// Render the field list.
    ///
    /// With `prefixed`, unqualified fields are qualified with the FROM alias
    /// (or table). With `only_primary`, only primary-key fields are rendered.
    pub fn get_query_fields(&self, prefixed: bool, only_primary: bool) -> Result<String> {
        let default_table = if prefixed { self.from_name() } else { None };
        self.fields.render(default_table, only_primary)
    }

    /// `FROM table [AS alias]`
    pub fn get_query_from(&self) -> Result<String> {
        match &self.from {
            Some((table, Some(alias))) => Ok(format!(
                "FROM {} AS {}",
                escape_identifier(table),
                escape_identifier(alias)
            )),
            Some((table, None)) => Ok(format!("FROM {}", escape_identifier(table))),
            None => Err(Error::InvalidQuery("no FROM table was set".to_string())),
        }
    }

    /// Alias of the FROM table, or the table itself.
    fn from_name(&self) -> Option<&str> {
        self.from
            .as_ref()
            .map(|(table, alias)| alias.as_deref().unwrap_or(table))
    }

    fn table(&self) -> Result<&str> {
        self.from
            .as_ref()
            .map(|(table, _)| table.as_str())
            .ok_or_else(|| Error::InvalidQuery("no target table was set".to_string()))
    }

    // ---- Where ----

    pub fn add_where(&mut self, condition: Condition) -> Result<&mut Self> {
        let predicate = condition.into_predicate(&mut self.bindings)?;
        self.wheres.push(predicate);
        Ok(self)
    }

    /// `field IN (values...)`, ANDed with the previous predicates.
    pub fn add_in<I, T>(&mut self, field: impl Into<String>, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        self.add_where(Condition::is_in(field, values))
    }

    /// Add a hand-written predicate, wrapped in parentheses.
    ///
    /// Placeholders it references must be bound with [`QueryBuilder::bind`].
    pub fn add_raw_where(&mut self, fragment: impl Into<String>, concat: Concat) -> &mut Self {
        self.wheres.push(Predicate {
            concat,
            expr: Expr::Raw(fragment.into()),
        });
        self
    }

    /// Match any of several keys, each key being `(column, value)` pairs.
    ///
    /// Renders one group: `((a = :a AND b = :b) OR (a = :a_1 AND b = :b_1))`.
    pub fn add_where_keys<K, C, V>(&mut self, keys: impl IntoIterator<Item = K>) -> Result<&mut Self>
    where
        K: IntoIterator<Item = (C, V)>,
        C: AsRef<str>,
        V: ToValue,
    {
        let mut groups = Vec::new();
        for key in keys {
            let mut terms = Vec::new();
            for (column, value) in key {
                let column = column.as_ref();
                let placeholder = self.bindings.bind(column, value.to_value(), true);
                terms.push((escape_identifier(column), placeholder));
            }
            if terms.is_empty() {
                return Err(Error::InvalidQuery("a lookup key has no columns".to_string()));
            }
            groups.push(terms);
        }
        if groups.is_empty() {
            return Err(Error::EmptyInValues("keys".to_string()));
        }
        self.wheres.push(Predicate {
            concat: Concat::And,
            expr: Expr::AnyKey(groups),
        });
        Ok(self)
    }

    pub fn has_where(&self) -> bool {
        !self.wheres.is_empty()
    }

    /// `WHERE ...`, or an empty string (or `EmptyWhereClause` when
    /// `fail_if_empty`).
    pub fn get_query_where(&self, fail_if_empty: bool) -> Result<String> {
        if fail_if_empty && self.wheres.is_empty() {
            return Err(Error::EmptyWhereClause);
        }
        Ok(self.wheres.render("WHERE"))
    }

    // ---- Join ----

    pub fn add_join(&mut self, join: Join) -> &mut Self {
        self.joins.add(join);
        self
    }

    pub fn has_join(&self) -> bool {
        !self.joins.is_empty()
    }

    pub fn get_query_join(&self) -> String {
        self.joins.render()
    }

    // ---- Order / Group / Having ----

    pub fn add_order(&mut self, field: impl Into<String>, direction: Direction) -> &mut Self {
        self.orders.add(field, direction);
        self
    }

    pub fn add_group(&mut self, field: impl Into<String>) -> &mut Self {
        self.groups.add(field);
        self
    }

    pub fn add_having(&mut self, condition: Condition) -> Result<&mut Self> {
        let predicate = condition.into_predicate(&mut self.bindings)?;
        self.havings.push(predicate);
        Ok(self)
    }

    pub fn get_query_order_by(&self) -> String {
        self.orders.render()
    }

    pub fn get_query_group_by(&self) -> String {
        self.groups.render()
    }

    pub fn get_query_having(&self) -> String {
        self.havings.render("HAVING")
    }

    // ---- Limit ----

    pub fn set_limit(&mut self, limit: u64, offset: Option<u64>) -> &mut Self {
        self.limit.set(limit, offset);
        self
    }

    pub fn get_query_limit(&self) -> String {
        self.limit.render()
    }

    // ---- Set ----

    /// Assign a column for INSERT / UPDATE. Setting a field again replaces
    /// its value.
    pub fn add_set<T: ToValue>(&mut self, field: impl Into<String>, value: T) -> &mut Self {
        let field = field.into();
        let placeholder = self.bindings.bind(&field, value.to_value(), false);
        self.sets.set(field, placeholder);
        self
    }

    /// Assign a column in the `ON DUPLICATE KEY UPDATE` clause.
    pub fn add_update<T: ToValue>(&mut self, field: impl Into<String>, value: T) -> &mut Self {
        let field = field.into();
        let placeholder = self
            .bindings
            .bind(&qualified(Some("update"), &field), value.to_value(), false);
        self.updates.set(field, placeholder);
        self
    }

    /// `SET ...`; fails with `EmptySetClause` when nothing was set.
    pub fn get_query_set(&self) -> Result<String> {
        if self.sets.is_empty() {
            return Err(Error::EmptySetClause);
        }
        Ok(format!("SET {}", self.sets.render()))
    }

    /// `ON DUPLICATE KEY UPDATE ...`, or an empty string.
    pub fn get_query_duplicate_update(&self) -> String {
        if self.updates.is_empty() {
            String::new()
        } else {
            format!("ON DUPLICATE KEY UPDATE {}", self.updates.render())
        }
    }

    // ---- Binding ----

    /// Bind a value and return its placeholder name (without the `:`).
    ///
    /// A non-unique bind reuses the field's placeholder and replaces its
    /// value; a unique bind always allocates `field_N`.
    pub fn bind<T: ToValue>(&mut self, field: &str, value: T, unique: bool) -> String {
        self.bindings.bind(field, value.to_value(), unique)
    }

    /// Every binding, in allocation order.
    pub fn get_all_bind(&self) -> &[Binding] {
        self.bindings.all()
    }

    // ---- List index ----

    /// Field whose value keys the map returned by indexed selects.
    pub fn set_list_index_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.list_index_field = Some(field.into());
        self
    }

    pub fn list_index_field(&self) -> Option<&str> {
        self.list_index_field.as_deref()
    }

    // ---- Rendering ----

    /// Render a statement with its parameters.
    ///
    /// Only the placeholders the statement references are passed along;
    /// a referenced placeholder without a bound value is an `InvalidQuery`.
    pub fn build(&self, kind: QueryKind) -> Result<BuiltQuery> {
        let (parts, referenced) = match kind {
            QueryKind::Select => (
                vec![
                    format!("SELECT {}", self.get_query_fields(self.has_join(), false)?),
                    self.get_query_from()?,
                    self.get_query_join(),
                    self.get_query_where(false)?,
                    self.get_query_group_by(),
                    self.get_query_having(),
                    self.get_query_order_by(),
                    self.get_query_limit(),
                ],
                self.filter_placeholders(),
            ),
            QueryKind::Count => (
                vec![
                    "SELECT COUNT(*) AS `count`".to_string(),
                    self.get_query_from()?,
                    self.get_query_join(),
                    self.get_query_where(false)?,
                    self.get_query_group_by(),
                    self.get_query_having(),
                ],
                self.filter_placeholders(),
            ),
            QueryKind::Insert => (
                vec![
                    format!("INSERT INTO {}", escape_identifier(self.table()?)),
                    self.get_query_set()?,
                    self.get_query_duplicate_update(),
                ],
                self.sets
                    .placeholders()
                    .into_iter()
                    .chain(self.updates.placeholders())
                    .map(str::to_string)
                    .collect(),
            ),
            QueryKind::Update => {
                let parts = vec![
                    format!("UPDATE {}", escape_identifier(self.table()?)),
                    self.get_query_set()?,
                    self.get_query_where(true)?,
                    self.get_query_order_by(),
                    self.get_query_limit(),
                ];
                let mut referenced: Vec<String> =
                    self.sets.placeholders().into_iter().map(str::to_string).collect();
                referenced.extend(self.where_placeholders());
                (parts, referenced)
            }
            QueryKind::Delete => (
                vec![
                    format!("DELETE FROM {}", escape_identifier(self.table()?)),
                    self.get_query_where(true)?,
                    self.get_query_order_by(),
                    self.get_query_limit(),
                ],
                self.where_placeholders(),
            ),
        };

        let sql = parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        for placeholder in &referenced {
            if !self.bindings.contains(placeholder) {
                return Err(Error::InvalidQuery(format!(
                    "placeholder :{} has no bound value",
                    placeholder
                )));
            }
        }

        let params = self
            .bindings
            .all()
            .iter()
            .filter(|b| referenced.iter().any(|p| *p == b.placeholder))
            .map(|b| (b.placeholder.clone(), b.value.clone()))
            .collect();

        Ok(BuiltQuery { sql, params })
    }

    fn where_placeholders(&self) -> Vec<String> {
        let mut placeholders: Vec<String> = self
            .wheres
            .placeholders()
            .into_iter()
            .map(str::to_string)
            .collect();
        for fragment in self.wheres.raw_fragments() {
            placeholders.extend(scan_placeholders(fragment));
        }
        placeholders
    }

    fn filter_placeholders(&self) -> Vec<String> {
        let mut placeholders = self.where_placeholders();
        placeholders.extend(self.havings.placeholders().into_iter().map(str::to_string));
        for fragment in self.havings.raw_fragments() {
            placeholders.extend(scan_placeholders(fragment));
        }
        placeholders
    }

    /// Reset every clause and binding.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Value bound to `placeholder`, if any.
    pub fn bound_value(&self, placeholder: &str) -> Option<&Value> {
        self.bindings.get(placeholder)
    }
}

/// `:name` references in a hand-written fragment. `::` casts and text inside
/// `'...'` or `"..."` literals are skipped.
fn scan_placeholders(fragment: &str) -> Vec<String> {
    let chars: Vec<char> = fragment.chars().collect();
    let mut found = Vec::new();
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            if c == '\\' {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
        } else if c == '\'' || c == '"' {
            quote = Some(c);
            i += 1;
        } else if c == ':' {
            if chars.get(i + 1) == Some(&':') {
                i += 2;
                continue;
            }
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            if end > start && !chars[start].is_ascii_digit() {
                found.push(chars[start..end].iter().collect());
            }
            i = end.max(i + 1);
        } else {
            i += 1;
        }
    }
    found
}
