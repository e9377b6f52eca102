//! Repository generator - the storage contract a mapper fulfils

use tracing::debug;

use super::TableContext;
use crate::config::Artifact;

/// Render the repository trait of a table.
pub fn generate_repository(ctx: &TableContext) -> String {
    let name = ctx.classname();
    let repository = ctx.model.repository_name();
    debug!(
        "Generating repository {} -> {}_repository.rs",
        repository,
        ctx.module_name()
    );

    let mut code = ctx.header("Repository");
    code.push_str(&format!(
        "use {}::{};\n\n",
        ctx.model.namespace(Artifact::Entity).unwrap_or("crate"),
        name
    ));

    code.push_str(&format!(
        "/// Storage operations on `{}` rows.\n#[mapgen::async_trait]\npub trait {}: Send + Sync {{\n",
        ctx.model.table(),
        repository
    ));

    let primary = ctx.primary_fields();
    if !primary.is_empty() {
        let params: Vec<String> = primary
            .iter()
            .map(|f| format!("{}: {}", f.name, f.rust_type.to_param_type_string()))
            .collect();
        code.push_str(&format!(
            "    async fn find_by_pk(&self, {}) -> mapgen::Result<Option<{}>>;\n\n",
            params.join(", "),
            name
        ));
    }
    code.push_str(&format!(
        "    async fn find_all(&self) -> mapgen::Result<Vec<{}>>;\n\n",
        name
    ));
    code.push_str(&format!(
        "    async fn insert(&self, entity: &mut {}) -> mapgen::Result<mapgen::ExecuteResult>;\n",
        name
    ));
    if !primary.is_empty() {
        code.push_str(&format!(
            "\n    async fn update(&self, entity: &{0}) -> mapgen::Result<u64>;\n\n    async fn delete(&self, entity: &{0}) -> mapgen::Result<u64>;\n",
            name
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

    #[test]
    fn test_repository_trait() {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw_configs(dir.path()), Some("user"))
            .unwrap();
        let schema = DdlSchema::from_sql(SCHEMA).unwrap();
        let model = configs.get("user").unwrap();
        let ctx = TableContext::new(model, &schema.describe("user").unwrap()).unwrap();
        let code = generate_repository(&ctx);

        assert!(code.starts_with("//! Repository for table `user`"));
        assert!(code.contains("use crate::entity::User;"));
        assert!(code.contains("#[mapgen::async_trait]\npub trait UserRepository: Send + Sync {"));
        assert!(code.contains("async fn find_by_pk(&self, id: u32) -> mapgen::Result<Option<User>>;"));
        assert!(code.contains("async fn delete(&self, entity: &User) -> mapgen::Result<u64>;"));
        assert!(syn::parse_file(&code).is_ok());
    }
}
