//! Mapper generator - per-table data access over a `mapgen::Executor`

use tracing::debug;

use super::naming::{generate_find_by_method_name, to_field_name};
use super::{GeneratedField, TableContext};
use crate::config::{Artifact, JoinDescriptor, Relation};

/// Render the mapper source file of a table.
///
/// With `with_repository` the mapper also implements the table's
/// repository trait.
pub fn generate_mapper(ctx: &TableContext, with_repository: bool) -> String {
    let name = ctx.classname();
    let mapper = ctx.model.mapper_name();
    debug!("Generating mapper {} -> {}_mapper.rs", mapper, ctx.module_name());

    let mut code = ctx.header("Mapper");
    code.push_str("use std::collections::BTreeMap;\nuse std::sync::Arc;\n\n");
    code.push_str(&format!(
        "use {}::{};\n\n",
        ctx.model.namespace(Artifact::Entity).unwrap_or("crate"),
        name
    ));

    code.push_str(&format!(
        r#"/// Data access for table `{table}`.
pub struct {mapper}<E: mapgen::Executor> {{
    executor: E,
    cache: Option<Arc<dyn mapgen::Cache>>,
}}

impl<E: mapgen::Executor> {mapper}<E> {{
    pub const TABLE: &'static str = {table:?};
    pub const CACHE_PREFIX: &'static str = {prefix:?};
    pub const CACHE_ENABLED: bool = {enabled};

    pub fn new(executor: E) -> Self {{
        Self {{
            executor,
            cache: None,
        }}
    }}

    /// Use `cache` for primary key lookups; ignored unless caching is
    /// enabled for the table.
    pub fn with_cache(mut self, cache: Arc<dyn mapgen::Cache>) -> Self {{
        self.cache = Some(cache);
        self
    }}

    pub fn executor(&self) -> &E {{
        &self.executor
    }}

    /// `SELECT` of every column, ready for more clauses.
    pub fn query(&self) -> mapgen::QueryBuilder {{
        mapgen::mapper::base_query::<{name}>()
    }}
"#,
        table = ctx.model.table(),
        mapper = mapper,
        prefix = ctx.model.cache_prefix(),
        enabled = ctx.model.cache_enabled(),
        name = name,
    ));

    let primary = ctx.primary_fields();
    if !primary.is_empty() {
        code.push_str(&generate_find_by_pk(name, &primary));
    }
    code.push_str(&generate_selects(name));
    if !primary.is_empty() {
        code.push_str(&generate_find_by_keys(name, &primary));
    }
    code.push_str(&generate_writes(name, !primary.is_empty()));
    for join in ctx.model.joins() {
        code.push_str(&generate_join(ctx, join));
    }
    code.push_str("}\n");

    if with_repository {
        code.push_str(&generate_repository_impl(ctx, &primary));
    }
    code
}

fn find_by_pk_name(primary: &[&GeneratedField]) -> String {
    let names: Vec<String> = primary.iter().map(|f| f.plain_name.clone()).collect();
    generate_find_by_method_name(&names)
}

/// `name: type` parameters of a primary key lookup.
fn key_params(primary: &[&GeneratedField]) -> String {
    primary
        .iter()
        .map(|f| format!("{}: {}", f.name, f.rust_type.to_param_type_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn key_values(primary: &[&GeneratedField]) -> String {
    primary
        .iter()
        .map(|f| format!("({:?}, mapgen::ToValue::to_value(&{}))", f.column, f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn generate_find_by_pk(name: &str, primary: &[&GeneratedField]) -> String {
    format!(
        r#"
    fn cache(&self) -> Option<&dyn mapgen::Cache> {{
        if Self::CACHE_ENABLED {{
            self.cache.as_deref()
        }} else {{
            None
        }}
    }}

    fn cache_key(key_values: &[(&'static str, mapgen::Value)]) -> String {{
        mapgen::cache_key(
            Self::CACHE_PREFIX,
            key_values.iter().map(|(_, value)| value.to_key_string()),
        )
    }}

    /// Find by primary key, through the cache when enabled.
    pub async fn {method}(&self, {params}) -> mapgen::Result<Option<{name}>> {{
        let key_values = vec![{values}];
        let key = Self::cache_key(&key_values);
        let mut qb = self.query();
        mapgen::mapper::add_primary_key::<{name}>(&mut qb, key_values)?;
        mapgen::mapper::fetch_one_cached::<{name}, _>(&self.executor, self.cache(), &key, &qb).await
    }}
"#,
        method = find_by_pk_name(primary),
        params = key_params(primary),
        values = key_values(primary),
        name = name,
    )
}

fn generate_selects(name: &str) -> String {
    format!(
        r#"
    pub async fn find_all(&self) -> mapgen::Result<Vec<{name}>> {{
        mapgen::mapper::fetch_all(&self.executor, &self.query()).await
    }}

    pub async fn select(&self, qb: &mapgen::QueryBuilder) -> mapgen::Result<Vec<{name}>> {{
        mapgen::mapper::fetch_all(&self.executor, qb).await
    }}

    pub async fn select_one(&self, qb: &mapgen::QueryBuilder) -> mapgen::Result<Option<{name}>> {{
        mapgen::mapper::fetch_one(&self.executor, qb).await
    }}

    /// Rows keyed by the builder's list-index field.
    pub async fn select_indexed(
        &self,
        qb: &mapgen::QueryBuilder,
    ) -> mapgen::Result<BTreeMap<String, {name}>> {{
        mapgen::mapper::fetch_indexed(&self.executor, qb).await
    }}

    pub async fn count(&self, qb: &mapgen::QueryBuilder) -> mapgen::Result<u64> {{
        mapgen::mapper::count(&self.executor, qb).await
    }}

    /// One page of `qb` plus the total matching rows ignoring its LIMIT.
    pub async fn select_with_found_rows(
        &self,
        qb: &mapgen::QueryBuilder,
    ) -> mapgen::Result<(Vec<{name}>, u64)> {{
        mapgen::mapper::fetch_all_with_found_rows(&self.executor, qb).await
    }}
"#,
        name = name,
    )
}

fn generate_find_by_keys(name: &str, primary: &[&GeneratedField]) -> String {
    let (key_type, pattern) = if primary.len() == 1 {
        (
            primary[0].rust_type.to_type_string(),
            primary[0].name.clone(),
        )
    } else {
        let types: Vec<String> = primary.iter().map(|f| f.rust_type.to_type_string()).collect();
        let names: Vec<String> = primary.iter().map(|f| f.name.clone()).collect();
        (
            format!("({})", types.join(", ")),
            format!("({})", names.join(", ")),
        )
    };
    let values: Vec<String> = primary
        .iter()
        .map(|f| format!("({:?}, mapgen::ToValue::to_value({}))", f.column, f.name))
        .collect();

    format!(
        r#"
    /// Rows matching any of `keys`.
    pub async fn find_by_keys(&self, keys: &[{key_type}]) -> mapgen::Result<Vec<{name}>> {{
        if keys.is_empty() {{
            return Ok(Vec::new());
        }}
        let mut qb = self.query();
        qb.add_where_keys(keys.iter().map(|{pattern}| [{values}]))?;
        mapgen::mapper::fetch_all(&self.executor, &qb).await
    }}
"#,
        key_type = key_type,
        name = name,
        pattern = pattern,
        values = values.join(", "),
    )
}

fn generate_writes(name: &str, keyed: bool) -> String {
    let mut code = format!(
        r#"
    /// Insert `entity`, storing the generated id back into it.
    pub async fn insert(&self, entity: &mut {name}) -> mapgen::Result<mapgen::ExecuteResult> {{
        mapgen::mapper::insert(&self.executor, entity).await
    }}
"#,
        name = name,
    );
    if !keyed {
        return code;
    }

    code.push_str(&format!(
        r#"
    /// Insert `entity`, or update every non-key column when the key exists.
    pub async fn upsert(&self, entity: &mut {name}) -> mapgen::Result<mapgen::ExecuteResult> {{
        let result = mapgen::mapper::upsert(&self.executor, entity).await?;
        self.invalidate(entity);
        Ok(result)
    }}

    pub async fn update(&self, entity: &{name}) -> mapgen::Result<u64> {{
        let affected = mapgen::mapper::update(&self.executor, entity).await?;
        self.invalidate(entity);
        Ok(affected)
    }}

    pub async fn delete(&self, entity: &{name}) -> mapgen::Result<u64> {{
        let affected = mapgen::mapper::delete(&self.executor, entity).await?;
        self.invalidate(entity);
        Ok(affected)
    }}

    fn invalidate(&self, entity: &{name}) {{
        if let Some(cache) = self.cache() {{
            cache.delete(&Self::cache_key(&mapgen::Entity::primary_key_values(entity)));
        }}
    }}
"#,
        name = name,
    ));
    code
}

fn generate_join(ctx: &TableContext, join: &JoinDescriptor) -> String {
    let method = to_field_name(join.alias());
    let target = join.target().entity_type_path();
    let (result_type, split) = match join.relation() {
        Relation::One => (format!("Option<{}>", target), "split_joined"),
        Relation::Many => (format!("Vec<{}>", target), "group_joined"),
    };

    format!(
        r#"
    /// Join `{alias}` ({relation}, `{table}` AS `{remote_alias}`), selecting its
    /// columns as `{alias}__<column>`.
    pub fn join_{method}(qb: &mut mapgen::QueryBuilder) -> &mut mapgen::QueryBuilder {{
        qb.add_join(
            mapgen::Join::new(mapgen::JoinType::{join_type:?}, {table:?}, {remote_alias:?})
                .on({local_alias:?}, {local_field:?}, {remote_field:?}),
        );
        for column in <{target} as mapgen::FromRow>::column_names() {{
            qb.add_field(
                mapgen::Field::new(*column)
                    .table({remote_alias:?})
                    .alias(format!("{alias}__{{}}", column)),
            );
        }}
        qb
    }}

    pub async fn select_with_{method}(
        &self,
        qb: &mapgen::QueryBuilder,
    ) -> mapgen::Result<Vec<({name}, {result_type})>> {{
        let mut qb = qb.clone();
        Self::join_{method}(&mut qb);
        let rows = mapgen::mapper::fetch_rows(&self.executor, &qb).await?;
        mapgen::mapper::{split}(&rows, {alias:?})
    }}
"#,
        alias = join.alias(),
        relation = join.relation(),
        table = join.target().table(),
        remote_alias = join.remote_alias(),
        method = method,
        join_type = join.join_type(),
        local_alias = join.local_alias(),
        local_field = join.local_field(),
        remote_field = join.remote_field(),
        target = target,
        name = ctx.classname(),
        result_type = result_type,
        split = split,
    )
}

fn generate_repository_impl(ctx: &TableContext, primary: &[&GeneratedField]) -> String {
    let name = ctx.classname();
    let mapper = ctx.model.mapper_name();

    let mut code = format!(
        "\n#[mapgen::async_trait]\nimpl<E: mapgen::Executor> {}::{} for {}<E> {{\n",
        ctx.model.namespace(Artifact::Repository).unwrap_or("crate"),
        ctx.model.repository_name(),
        mapper
    );
    if !primary.is_empty() {
        let args: Vec<&str> = primary.iter().map(|f| f.name.as_str()).collect();
        code.push_str(&format!(
            r#"    async fn find_by_pk(&self, {params}) -> mapgen::Result<Option<{name}>> {{
        {mapper}::<E>::{find_by}(self, {args}).await
    }}

"#,
            params = key_params(primary),
            name = name,
            mapper = mapper,
            find_by = find_by_pk_name(primary),
            args = args.join(", "),
        ));
    }
    code.push_str(&format!(
        r#"    async fn find_all(&self) -> mapgen::Result<Vec<{name}>> {{
        {mapper}::<E>::find_all(self).await
    }}

    async fn insert(&self, entity: &mut {name}) -> mapgen::Result<mapgen::ExecuteResult> {{
        {mapper}::<E>::insert(self, entity).await
    }}
"#,
        name = name,
        mapper = mapper,
    ));
    if !primary.is_empty() {
        code.push_str(&format!(
            r#"
    async fn update(&self, entity: &{name}) -> mapgen::Result<u64> {{
        {mapper}::<E>::update(self, entity).await
    }}

    async fn delete(&self, entity: &{name}) -> mapgen::Result<u64> {{
        {mapper}::<E>::delete(self, entity).await
    }}
"#,
            name = name,
            mapper = mapper,
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

    fn render(table: &str, with_repository: bool) -> String {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw_configs(dir.path()), None)
            .unwrap();
        let schema = DdlSchema::from_sql(SCHEMA).unwrap();
        let model = configs.get(table).unwrap();
        let ctx = TableContext::new(model, &schema.describe(model.table()).unwrap()).unwrap();
        generate_mapper(&ctx, with_repository)
    }

    #[test]
    fn test_mapper_parses() {
        for table in ["user", "address", "user_role"] {
            let code = render(table, true);
            if let Err(e) = syn::parse_file(&code) {
                panic!("mapper for {} does not parse: {}\n{}", table, e, code);
            }
        }
    }

    #[test]
    fn test_mapper_constants_and_lookups() {
        let code = render("user", false);
        assert!(code.starts_with("//! Mapper for table `user`"));
        assert!(code.contains("use crate::entity::User;"));
        assert!(code.contains("pub struct UserMapper<E: mapgen::Executor> {"));
        assert!(code.contains("pub const CACHE_PREFIX: &'static str = \"app.user\";"));
        assert!(code.contains("pub const CACHE_ENABLED: bool = true;"));
        assert!(code.contains(
            "pub async fn find_by_id(&self, id: u32) -> mapgen::Result<Option<User>> {"
        ));
        assert!(code.contains("let key_values = vec![(\"usr_id\", mapgen::ToValue::to_value(&id))];"));
        assert!(code.contains("pub async fn find_by_keys(&self, keys: &[u32])"));
        assert!(code.contains("keys.iter().map(|id| [(\"usr_id\", mapgen::ToValue::to_value(id))])"));
        assert!(!code.contains("impl<E: mapgen::Executor> crate::repository::UserRepository"));
    }

    #[test]
    fn test_composite_key_lookups() {
        let code = render("user_role", false);
        assert!(code.contains("pub async fn find_by_user_id_and_role(&self, user_id: u32, role: &str)"));
        assert!(code.contains("keys: &[(u32, String)]"));
        assert!(code.contains("keys.iter().map(|(user_id, role)| ["));
        assert!(code.contains("pub const CACHE_ENABLED: bool = false;"));
    }

    #[test]
    fn test_join_helpers() {
        let code = render("user", false);
        assert!(code.contains("pub fn join_address(qb: &mut mapgen::QueryBuilder)"));
        assert!(code.contains(
            "mapgen::Join::new(mapgen::JoinType::LeftOuter, \"address\", \"address\")"
        ));
        assert!(code.contains(".on(\"user\", \"usr_address_id\", \"id\")"));
        assert!(code.contains("<crate::entity::Address as mapgen::FromRow>::column_names()"));
        assert!(code.contains(".alias(format!(\"address__{}\", column))"));
        assert!(code.contains("mapgen::Result<Vec<(User, Option<crate::entity::Address>)>>"));
        assert!(code.contains("mapgen::mapper::split_joined(&rows, \"address\")"));
        assert!(code.contains("mapgen::Result<Vec<(User, Vec<crate::entity::UserRole>)>>"));
        assert!(code.contains("mapgen::mapper::group_joined(&rows, \"roles\")"));
    }

    #[test]
    fn test_repository_impl() {
        let code = render("user", true);
        assert!(code.contains("#[mapgen::async_trait]"));
        assert!(code.contains(
            "impl<E: mapgen::Executor> crate::repository::UserRepository for UserMapper<E> {"
        ));
        assert!(code.contains("UserMapper::<E>::find_by_id(self, id).await"));
    }
}
