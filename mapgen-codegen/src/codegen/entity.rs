//! Entity generator - one data-holder struct per table

use tracing::debug;

use super::{GeneratedField, TableContext};
use crate::config::ValidationRule;

/// Render the entity source file of a table.
pub fn generate_entity(ctx: &TableContext) -> String {
    let name = ctx.classname();
    debug!("Generating entity {} -> {}.rs", name, ctx.module_name());

    let mut code = ctx.header("Entity");

    code.push_str(&format!("/// Row of table `{}`.\n", ctx.model.table()));
    code.push_str("#[derive(Debug, Clone, PartialEq)]\n");
    code.push_str(&format!("pub struct {} {{\n", name));
    for field in &ctx.fields {
        code.push_str(&format!(
            "    {}: {},\n",
            field.name,
            field.rust_type.to_type_string()
        ));
    }
    code.push_str("}\n\n");

    code.push_str(&generate_default(ctx));
    code.push_str(&generate_accessors(ctx));
    code.push_str(&generate_from_row(ctx));
    code.push_str(&generate_entity_impl(ctx));
    code
}

fn generate_default(ctx: &TableContext) -> String {
    let mut code = format!("impl Default for {} {{\n", ctx.classname());
    code.push_str("    fn default() -> Self {\n        Self {\n");
    for field in &ctx.fields {
        code.push_str(&format!(
            "            {}: {},\n",
            field.name,
            field.column_type.empty_value(field.nullable)
        ));
    }
    code.push_str("        }\n    }\n}\n\n");
    code
}

fn generate_accessors(ctx: &TableContext) -> String {
    let mut code = format!("impl {} {{\n", ctx.classname());
    code.push_str("    pub fn new() -> Self {\n        Self::default()\n    }\n");

    for field in &ctx.fields {
        let (ret_type, expr) = field.rust_type.getter(&field.name);
        code.push_str(&format!(
            r#"
    /// Column `{column}`
    pub fn {name}(&self) -> {ret_type} {{
        {expr}
    }}
"#,
            column = field.column,
            name = field.name,
            ret_type = ret_type,
            expr = expr,
        ));
        code.push_str(&generate_setter(field));
    }

    code.push_str("}\n\n");
    code
}

fn generate_setter(field: &GeneratedField) -> String {
    let ty = field.rust_type.to_type_string();
    match &field.validation {
        None => format!(
            r#"
    pub fn set_{plain}(&mut self, value: {ty}) -> &mut Self {{
        self.{name} = value;
        self
    }}
"#,
            plain = field.plain_name,
            ty = ty,
            name = field.name,
        ),
        Some(rule) => format!(
            r#"
    /// Sets `{column}` after checking it with the `{kind}` validator.
    pub fn set_{plain}(&mut self, value: {ty}) -> mapgen::Result<&mut Self> {{
        let options = {options};
        let checked = mapgen::validate(
            mapgen::ValidatorKind::{kind_variant:?},
            &mapgen::ToValue::to_value(&value),
            &options,
        )?;
        self.{name} = {cast};
        Ok(self)
    }}
"#,
            column = field.column,
            kind = rule.kind,
            plain = field.plain_name,
            ty = ty,
            options = options_expression(rule),
            kind_variant = rule.kind,
            name = field.name,
            cast = field.column_type.cast_expression("checked", field.nullable),
        ),
    }
}

/// Builder expression reproducing a rule's options.
fn options_expression(rule: &ValidationRule) -> String {
    let options = &rule.options;
    let mut expr = String::from("mapgen::ValidationOptions::new()");
    if let Some(min) = options.min {
        expr.push_str(&format!(".min({}i128)", min));
    }
    if let Some(max) = options.max {
        expr.push_str(&format!(".max({}i128)", max));
    }
    if let Some(preset) = options.preset {
        expr.push_str(&format!(".preset(mapgen::IntegerPreset::{:?})", preset));
    }
    if let Some(pattern) = &options.pattern {
        expr.push_str(&format!(".pattern({:?})", pattern));
    }
    if options.hostname {
        expr.push_str(".hostname(true)");
    }
    if options.allow_null {
        expr.push_str(".allow_null(true)");
    }
    expr
}

fn generate_from_row(ctx: &TableContext) -> String {
    let mut code = format!("impl mapgen::FromRow for {} {{\n", ctx.classname());
    code.push_str("    fn from_row(row: &mapgen::Row) -> mapgen::Result<Self> {\n");
    code.push_str("        Ok(Self {\n");
    for field in &ctx.fields {
        let raw = format!("row.get_value({:?})?", field.column);
        code.push_str(&format!(
            "            {}: {},\n",
            field.name,
            field.column_type.cast_expression(&raw, field.nullable)
        ));
    }
    code.push_str("        })\n    }\n\n");

    let columns: Vec<String> = ctx
        .fields
        .iter()
        .map(|f| format!("{:?}", f.column))
        .collect();
    code.push_str(&format!(
        "    fn column_names() -> &'static [&'static str] {{\n        &[{}]\n    }}\n}}\n\n",
        columns.join(", ")
    ));
    code
}

fn generate_entity_impl(ctx: &TableContext) -> String {
    let primary_keys: Vec<String> = ctx
        .primary_fields()
        .iter()
        .map(|f| format!("{:?}", f.column))
        .collect();
    let auto_increment = match ctx.auto_increment_field() {
        Some(field) => format!("Some({:?})", field.column),
        None => "None".to_string(),
    };

    let mut code = format!("impl mapgen::Entity for {} {{\n", ctx.classname());
    code.push_str(&format!(
        "    const TABLE: &'static str = {:?};\n",
        ctx.model.table()
    ));
    code.push_str(&format!(
        "    const PRIMARY_KEYS: &'static [&'static str] = &[{}];\n",
        primary_keys.join(", ")
    ));
    code.push_str(&format!(
        "    const AUTO_INCREMENT: Option<&'static str> = {};\n\n",
        auto_increment
    ));

    code.push_str("    fn values(&self) -> Vec<(&'static str, mapgen::Value)> {\n        vec![\n");
    for field in &ctx.fields {
        code.push_str(&format!(
            "            ({:?}, mapgen::ToValue::to_value(&self.{})),\n",
            field.column, field.name
        ));
    }
    code.push_str("        ]\n    }\n");

    if let Some(field) = ctx.auto_increment_field() {
        let inner = field.rust_type.inner_type().to_type_string();
        let assign = if field.nullable {
            format!("self.{} = {}::try_from(id).ok();", field.name, inner)
        } else {
            format!(
                "if let Ok(id) = {}::try_from(id) {{\n            self.{} = id;\n        }}",
                inner, field.name
            )
        };
        code.push_str(&format!(
            "\n    fn set_auto_increment_id(&mut self, id: u64) {{\n        {}\n    }}\n",
            assign
        ));
    }

    code.push_str("}\n");
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::{raw_configs, SCHEMA};
    use crate::config::ConfigResolver;
    use crate::schema::{DdlSchema, SchemaSource};

    fn render(table: &str) -> String {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw_configs(dir.path()), None)
            .unwrap();
        let schema = DdlSchema::from_sql(SCHEMA).unwrap();
        let model = configs.get(table).unwrap();
        let ctx = TableContext::new(model, &schema.describe(model.table()).unwrap()).unwrap();
        generate_entity(&ctx)
    }

    #[test]
    fn test_entity_struct_and_header() {
        let code = render("user");
        assert!(code.starts_with("//! Entity for table `user`"));
        assert!(code.contains("//! @author jane"));
        assert!(code.contains("pub struct User {\n    id: u32,\n    email: String,\n    age: Option<u8>,\n    r#type: String,\n    address_id: Option<i64>,\n}"));
        assert!(code.contains("            age: None,\n"));
        assert!(code.contains("            email: String::new(),\n"));
        assert!(syn::parse_file(&code).is_ok(), "generated entity must parse");
    }

    #[test]
    fn test_getters_and_setters() {
        let code = render("user");
        assert!(code.contains("pub fn email(&self) -> &str {\n        &self.email\n    }"));
        assert!(code.contains("pub fn r#type(&self) -> &str"));
        assert!(code.contains("pub fn set_type(&mut self, value: String) -> &mut Self {"));
        assert!(code.contains(
            "pub fn set_email(&mut self, value: String) -> mapgen::Result<&mut Self> {"
        ));
        assert!(code.contains("mapgen::ValidatorKind::Email"));
        assert!(code.contains("mapgen::ValidationOptions::new().hostname(true)"));
        assert!(code.contains(
            "mapgen::ValidationOptions::new().preset(mapgen::IntegerPreset::TinyIntUnsigned).allow_null(true)"
        ));
        assert!(code.contains(
            "self.age = <Option<u8> as mapgen::FromValue>::from_value(checked)?;"
        ));
    }

    #[test]
    fn test_row_mapping_and_entity_impl() {
        let code = render("user");
        assert!(code.contains(
            "id: <u32 as mapgen::FromValue>::from_value(row.get_value(\"usr_id\")?)?,"
        ));
        assert!(code.contains(
            "&[\"usr_id\", \"usr_email\", \"usr_age\", \"usr_type\", \"usr_address_id\"]"
        ));
        assert!(code.contains("const TABLE: &'static str = \"user\";"));
        assert!(code.contains("const PRIMARY_KEYS: &'static [&'static str] = &[\"usr_id\"];"));
        assert!(code.contains("const AUTO_INCREMENT: Option<&'static str> = Some(\"usr_id\");"));
        assert!(code.contains("(\"usr_type\", mapgen::ToValue::to_value(&self.r#type)),"));
        assert!(code.contains("if let Ok(id) = u32::try_from(id) {"));
    }

    #[test]
    fn test_composite_key_without_auto_increment() {
        let code = render("user_role");
        assert!(code.contains("pub struct UserRole {"));
        assert!(code.contains("&[\"user_id\", \"role\"];"));
        assert!(code.contains("const AUTO_INCREMENT: Option<&'static str> = None;"));
        assert!(!code.contains("fn set_auto_increment_id"));
        assert!(syn::parse_file(&code).is_ok());
    }
}
