//! Selected fields

use super::ident::{escape_identifier, qualified};
use crate::error::{Error, Result};

/// One selected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub table: Option<String>,
    pub alias: Option<String>,
    pub escape: bool,
    pub primary: bool,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            alias: None,
            escape: true,
            primary: false,
        }
    }

    /// Select the field `AS alias`.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Qualify the field with a table name or alias.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Emit the name verbatim, e.g. for expressions like `COUNT(*)`.
    pub fn raw(mut self) -> Self {
        self.escape = false;
        self
    }

    /// Mark the field as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary = true;
        self
    }

    fn render(&self, default_table: Option<&str>) -> String {
        let mut sql = if self.escape {
            let table = self.table.as_deref().or(default_table);
            escape_identifier(&qualified(table, &self.name))
        } else {
            self.name.clone()
        };
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(&escape_identifier(alias));
        }
        sql
    }
}

/// The SELECT field list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList {
    fields: Vec<Field>,
    calc_found_rows: bool,
}

impl FieldList {
    pub fn add(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn set_calc_found_rows(&mut self, enabled: bool) {
        self.calc_found_rows = enabled;
    }

    pub fn calc_found_rows(&self) -> bool {
        self.calc_found_rows
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Render the list. Unqualified fields get `default_table` when given;
    /// an empty list selects `*`.
    pub fn render(&self, default_table: Option<&str>, only_primary: bool) -> Result<String> {
        let fields: Vec<&Field> = self
            .fields
            .iter()
            .filter(|f| !only_primary || f.primary)
            .collect();

        if only_primary && fields.is_empty() {
            return Err(Error::InvalidQuery(
                "no primary key field was selected".to_string(),
            ));
        }

        let list = if fields.is_empty() {
            match default_table {
                Some(table) => escape_identifier(&format!("{}.*", table)),
                None => "*".to_string(),
            }
        } else {
            fields
                .iter()
                .map(|f| f.render(default_table))
                .collect::<Vec<_>>()
                .join(", ")
        };

        if self.calc_found_rows {
            Ok(format!("SQL_CALC_FOUND_ROWS {}", list))
        } else {
            Ok(list)
        }
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.calc_found_rows = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_selects_everything() {
        let list = FieldList::default();
        assert_eq!(list.render(None, false).unwrap(), "*");
        assert_eq!(list.render(Some("u"), false).unwrap(), "`u`.*");
    }

    #[test]
    fn test_render_fields() {
        let mut list = FieldList::default();
        list.add(Field::new("id").primary_key());
        list.add(Field::new("name").table("a").alias("address__name"));
        list.add(Field::new("COUNT(*)").raw().alias("total"));

        assert_eq!(
            list.render(Some("u"), false).unwrap(),
            "`u`.`id`, `a`.`name` AS `address__name`, COUNT(*) AS `total`"
        );
        assert_eq!(list.render(None, true).unwrap(), "`id`");
    }

    #[test]
    fn test_only_primary_without_key_fails() {
        let mut list = FieldList::default();
        list.add(Field::new("name"));
        assert!(matches!(
            list.render(None, true),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_calc_found_rows() {
        let mut list = FieldList::default();
        list.set_calc_found_rows(true);
        assert_eq!(list.render(None, false).unwrap(), "SQL_CALC_FOUND_ROWS *");
    }
}
