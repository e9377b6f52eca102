//! Schema source backed by CREATE TABLE statements, parsed with sqlparser-rs

use std::collections::BTreeMap;
use std::path::Path;

use sqlparser::ast::{
    ColumnOption, Expr, Ident, IndexColumn, ObjectName, PrimaryKeyConstraint, Statement,
    TableConstraint, UniqueConstraint,
};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use super::{ColumnDescriptor, KeyRole, SchemaSource};
use crate::error::{CodegenError, Result};

/// Tables declared in a SQL DDL script.
#[derive(Debug, Clone, Default)]
pub struct DdlSchema {
    tables: BTreeMap<String, Vec<ColumnDescriptor>>,
}

impl DdlSchema {
    /// Parse a SQL schema string. Statements other than CREATE TABLE are
    /// ignored.
    pub fn from_sql(sql: &str) -> Result<Self> {
        let dialect = MySqlDialect {};
        let statements = Parser::parse_sql(&dialect, sql)?;

        let mut tables = BTreeMap::new();
        for stmt in statements {
            if let Statement::CreateTable(create_table) = stmt {
                let name = extract_table_name(&create_table.name);
                let columns = extract_columns(&create_table);
                debug!("Parsed table {} ({} columns)", name, columns.len());
                tables.insert(name, columns);
            }
        }

        Ok(Self { tables })
    }

    /// Read and parse a schema file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let sql = std::fs::read_to_string(path)?;
        Self::from_sql(&sql)
    }

    /// Names of the declared tables, sorted.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

impl SchemaSource for DdlSchema {
    fn describe(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| CodegenError::MissingTable(table.to_string()))
    }
}

/// Column descriptors of a CREATE TABLE statement, with table-level key
/// constraints folded into each column's key role.
fn extract_columns(create: &sqlparser::ast::CreateTable) -> Vec<ColumnDescriptor> {
    let mut columns: Vec<ColumnDescriptor> = create.columns.iter().map(extract_column).collect();

    for constraint in &create.constraints {
        match constraint {
            TableConstraint::PrimaryKey(PrimaryKeyConstraint {
                columns: pk_cols, ..
            }) => {
                for pk_col in pk_cols {
                    let col_name = extract_ident_from_index_column(pk_col);
                    if let Some(col) = columns.iter_mut().find(|c| c.field == col_name) {
                        col.key = KeyRole::Primary;
                        col.nullable = false;
                    }
                }
            }
            TableConstraint::Unique(UniqueConstraint {
                columns: uniq_cols, ..
            }) if uniq_cols.len() == 1 => {
                let col_name = extract_ident_from_index_column(&uniq_cols[0]);
                if let Some(col) = columns.iter_mut().find(|c| c.field == col_name) {
                    if col.key == KeyRole::None {
                        col.key = KeyRole::Unique;
                    }
                }
            }
            _ => {}
        }
    }

    columns
}

/// Column descriptor of a column definition
fn extract_column(col_def: &sqlparser::ast::ColumnDef) -> ColumnDescriptor {
    let mut column = ColumnDescriptor::new(
        extract_ident(&col_def.name),
        format!("{}", col_def.data_type),
    )
    .nullable(true);
    let mut extra = Vec::new();

    for option in &col_def.options {
        match &option.option {
            ColumnOption::NotNull => {
                column.nullable = false;
            }
            ColumnOption::Null => {
                column.nullable = true;
            }
            ColumnOption::Default(expr) => {
                column.default = Some(format!("{}", expr));
            }
            ColumnOption::PrimaryKey(_) => {
                column.key = KeyRole::Primary;
                column.nullable = false;
            }
            ColumnOption::Unique(_) => {
                if column.key == KeyRole::None {
                    column.key = KeyRole::Unique;
                }
            }
            ColumnOption::DialectSpecific(tokens) => {
                // AUTO_INCREMENT arrives as a MySQL-specific token
                let token_str = tokens
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_uppercase();
                if token_str.contains("AUTO_INCREMENT") {
                    extra.push("auto_increment");
                }
            }
            _ => {}
        }
    }

    column.extra = extra.join(" ");
    column
}

/// Extract a simple string from an ObjectName
fn extract_table_name(name: &ObjectName) -> String {
    name.0
        .last()
        .and_then(|part| part.as_ident())
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}

/// Extract a string from an Ident, removing backticks if present
fn extract_ident(ident: &Ident) -> String {
    ident.value.clone()
}

/// Extract a column name string from an IndexColumn
fn extract_ident_from_index_column(ic: &IndexColumn) -> String {
    match &ic.column.expr {
        Expr::Identifier(ident) => ident.value.clone(),
        other => format!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnKind, TypeRegistry};

    #[test]
    fn test_parse_simple_table() {
        let sql = r#"
            CREATE TABLE users (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                username VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                bio TEXT
            );
        "#;

        let schema = DdlSchema::from_sql(sql).unwrap();
        assert_eq!(schema.tables().collect::<Vec<_>>(), vec!["users"]);

        let columns = schema.describe("users").unwrap();
        assert_eq!(columns.len(), 4);
        assert!(columns[0].is_primary());
        assert!(columns[0].is_auto_increment());
        assert!(!columns[0].nullable);
        assert_eq!(columns[2].key, KeyRole::Unique);
        assert!(columns[3].nullable);
    }

    #[test]
    fn test_missing_table() {
        let schema = DdlSchema::from_sql("CREATE TABLE a (id INT);").unwrap();
        assert!(matches!(
            schema.describe("b"),
            Err(CodegenError::MissingTable(ref name)) if name == "b"
        ));
    }

    #[test]
    fn test_parse_composite_primary_key() {
        let sql = r#"
            CREATE TABLE order_items (
                order_id BIGINT,
                product_id BIGINT,
                quantity INT NOT NULL DEFAULT 1,
                PRIMARY KEY (order_id, product_id)
            );
        "#;

        let columns = DdlSchema::from_sql(sql)
            .unwrap()
            .describe("order_items")
            .unwrap();
        let keys: Vec<_> = columns
            .iter()
            .filter(|c| c.is_primary())
            .map(|c| c.field.as_str())
            .collect();
        assert_eq!(keys, vec!["order_id", "product_id"]);
        assert!(!columns[0].nullable);
        assert_eq!(columns[2].default.as_deref(), Some("1"));
    }

    #[test]
    fn test_raw_types_resolve() {
        let sql = r#"
            CREATE TABLE items (
                id INT UNSIGNED NOT NULL,
                active TINYINT(1) NOT NULL,
                price DECIMAL(10,2),
                status ENUM('ACTIVE', 'INACTIVE') NOT NULL,
                created_at DATETIME
            );
        "#;

        let columns = DdlSchema::from_sql(sql).unwrap().describe("items").unwrap();
        let kinds: Vec<_> = columns
            .iter()
            .map(|c| TypeRegistry::resolve(&c.raw_type).unwrap())
            .collect();
        assert_eq!(kinds[0].kind(), ColumnKind::Int);
        assert!(kinds[0].is_unsigned());
        assert_eq!(kinds[1].kind(), ColumnKind::Boolean);
        assert_eq!((kinds[2].display_width(), kinds[2].scale()), (10, 2));
        assert_eq!(kinds[3].values(), ["ACTIVE", "INACTIVE"]);
        assert_eq!(kinds[4].kind(), ColumnKind::DateTime);
    }
}
