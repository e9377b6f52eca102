//! Code generation: entity, mapper and repository sources per table

mod entity;
mod mapper;
pub mod naming;
mod repository;
mod sink;

pub use entity::generate_entity;
pub use mapper::generate_mapper;
pub use repository::generate_repository;
pub use sink::{format_source, CodeSink, DryRunSink, FileSink};

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::{Artifact, ConfigModel, ResolvedConfigs, ValidationRule};
use crate::error::{CodegenError, Result};
use crate::schema::{ColumnDescriptor, SchemaSource};
use crate::types::{ColumnType, RustType, TypeRegistry};
use naming::{escape_field_name, to_field_name, to_module_name};

/// One column as it appears in generated code.
#[derive(Debug, Clone)]
pub struct GeneratedField {
    /// Column name in the database.
    pub column: String,
    /// Field identifier, escaped when it collides with a keyword.
    pub name: String,
    /// Unescaped snake_case name, used to build method names.
    pub plain_name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary: bool,
    pub auto_increment: bool,
    pub rust_type: RustType,
    pub validation: Option<ValidationRule>,
}

/// A resolved model together with the fields of its table.
#[derive(Debug)]
pub struct TableContext<'a> {
    pub model: &'a ConfigModel,
    pub fields: Vec<GeneratedField>,
}

impl<'a> TableContext<'a> {
    /// Map the described columns of `model`'s table to fields.
    pub fn new(model: &'a ConfigModel, columns: &[ColumnDescriptor]) -> Result<Self> {
        let mut fields = Vec::with_capacity(columns.len());
        let mut seen = BTreeSet::new();

        for column in columns {
            let column_type = TypeRegistry::resolve(&column.raw_type)?;
            let stripped = model.strip_prefix(&column.field);
            let plain_name = to_field_name(stripped);
            if !seen.insert(plain_name.clone()) {
                return Err(CodegenError::invalid(
                    model.name(),
                    "database.prefix",
                    format!(
                        "maps more than one column of `{}` to field `{}`",
                        model.table(),
                        plain_name
                    ),
                ));
            }

            let primary = column.is_primary();
            let nullable = column.nullable && !primary;
            let validation = model
                .validation_for(&column.field)
                .or_else(|| model.validation_for(stripped))
                .cloned();

            fields.push(GeneratedField {
                column: column.field.clone(),
                name: escape_field_name(stripped),
                plain_name,
                rust_type: column_type.rust_type_for(nullable),
                column_type,
                nullable,
                primary,
                auto_increment: column.is_auto_increment(),
                validation,
            });
        }

        let context = Self { model, fields };
        context.check_validation_fields()?;
        context.check_join_fields()?;
        Ok(context)
    }

    pub fn classname(&self) -> &str {
        self.model.classname()
    }

    pub fn primary_fields(&self) -> Vec<&GeneratedField> {
        self.fields.iter().filter(|f| f.primary).collect()
    }

    /// The auto-increment field, when it maps to an integer.
    pub fn auto_increment_field(&self) -> Option<&GeneratedField> {
        self.fields
            .iter()
            .find(|f| f.auto_increment && f.rust_type.is_integer())
    }

    pub fn field_for_column(&self, column: &str) -> Option<&GeneratedField> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// Source file name shared by the three artifacts of this table.
    pub fn module_name(&self) -> String {
        to_module_name(self.model.classname())
    }

    /// The `//!` header carrying authorship.
    pub fn header(&self, what: &str) -> String {
        format!(
            "//! {} for table `{}`\n//!\n//! @author {}\n//! @copyright {}\n//!\n//! Generated by mapgen-codegen. Do not edit.\n\n",
            what,
            self.model.table(),
            self.model.author(),
            self.model.copyright()
        )
    }

    fn check_validation_fields(&self) -> Result<()> {
        for field in self.model.validation().keys() {
            let known = self
                .fields
                .iter()
                .any(|f| &f.column == field || self.model.strip_prefix(&f.column) == field);
            if !known {
                return Err(CodegenError::invalid(
                    self.model.name(),
                    format!("validation.{}", field),
                    format!("names no column of `{}`", self.model.table()),
                ));
            }
        }
        Ok(())
    }

    fn check_join_fields(&self) -> Result<()> {
        for join in self.model.joins() {
            let local_known = join.local_alias() != self.model.table()
                || self.field_for_column(join.local_field()).is_some();
            if !local_known {
                return Err(CodegenError::invalid(
                    self.model.name(),
                    format!("joins.{}.local_field", join.alias()),
                    format!(
                        "names no column of `{}`: {:?}",
                        self.model.table(),
                        join.local_field()
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Which artifacts a run emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    pub entities: bool,
    pub mappers: bool,
    pub repositories: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            entities: true,
            mappers: true,
            repositories: true,
        }
    }
}

/// Files produced by one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub tables: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Renders every resolved model into a sink.
pub struct Generator<'a> {
    configs: &'a ResolvedConfigs,
    schema: &'a dyn SchemaSource,
    sink: &'a dyn CodeSink,
    options: EmitOptions,
}

impl<'a> Generator<'a> {
    pub fn new(
        configs: &'a ResolvedConfigs,
        schema: &'a dyn SchemaSource,
        sink: &'a dyn CodeSink,
    ) -> Self {
        Self {
            configs,
            schema,
            sink,
            options: EmitOptions::default(),
        }
    }

    pub fn options(mut self, options: EmitOptions) -> Self {
        self.options = options;
        self
    }

    /// Describe, check and render every model, then write the sources.
    ///
    /// All tables are rendered before the first file is written, so a
    /// failing table leaves the output untouched.
    pub fn run(&self) -> Result<GenerationReport> {
        let mut described: BTreeMap<String, Vec<ColumnDescriptor>> = BTreeMap::new();
        let mut rendered: Vec<(PathBuf, String)> = Vec::new();
        let mut report = GenerationReport::default();

        for model in self.configs.models() {
            let columns = self.describe(&mut described, model.table())?;
            let context = TableContext::new(model, &columns)?;
            self.check_remote_fields(&mut described, model)?;
            debug!(
                "Rendering {} ({} fields, {} joins)",
                model.name(),
                context.fields.len(),
                model.joins().len()
            );

            let file = format!("{}.rs", context.module_name());
            if self.options.entities {
                rendered.push((self.target(model, Artifact::Entity, &file)?, generate_entity(&context)));
            }
            if self.options.mappers {
                let with_repository = self.options.repositories && model.has_repository();
                rendered.push((
                    self.target(model, Artifact::Mapper, &format!("{}_mapper.rs", context.module_name()))?,
                    generate_mapper(&context, with_repository),
                ));
            }
            if self.options.repositories && model.has_repository() {
                rendered.push((
                    self.target(
                        model,
                        Artifact::Repository,
                        &format!("{}_repository.rs", context.module_name()),
                    )?,
                    generate_repository(&context),
                ));
            }
            report.tables.push(model.name().to_string());
        }

        let mut dirs = BTreeSet::new();
        for (path, contents) in &rendered {
            self.sink.write(path, contents)?;
            if let Some(parent) = path.parent() {
                dirs.insert(parent.to_path_buf());
            }
            report.files.push(path.clone());
        }
        self.sink.finish(&dirs)?;

        info!(
            "Generated {} files for {} tables",
            report.files.len(),
            report.tables.len()
        );
        Ok(report)
    }

    fn describe(
        &self,
        described: &mut BTreeMap<String, Vec<ColumnDescriptor>>,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>> {
        if let Some(columns) = described.get(table) {
            return Ok(columns.clone());
        }
        let columns = self.schema.describe(table)?;
        described.insert(table.to_string(), columns.clone());
        Ok(columns)
    }

    fn check_remote_fields(
        &self,
        described: &mut BTreeMap<String, Vec<ColumnDescriptor>>,
        model: &ConfigModel,
    ) -> Result<()> {
        for join in model.joins() {
            let columns = self.describe(described, join.target().table())?;
            if !columns.iter().any(|c| c.field == join.remote_field()) {
                return Err(CodegenError::invalid(
                    model.name(),
                    format!("joins.{}.remote_field", join.alias()),
                    format!(
                        "names no column of `{}`: {:?}",
                        join.target().table(),
                        join.remote_field()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn target(&self, model: &ConfigModel, artifact: Artifact, file: &str) -> Result<PathBuf> {
        self.configs
            .artifact_dir(model, artifact)
            .map(|dir| dir.join(file))
            .ok_or_else(|| CodegenError::missing(model.name(), format!("path.{}", artifact)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs;

    use super::*;
    use crate::config::{load_raw_configs, ConfigResolver, RawConfigs};
    use crate::schema::DdlSchema;

    pub(crate) const SCHEMA: &str = r#"
        CREATE TABLE user (
            usr_id INT UNSIGNED NOT NULL AUTO_INCREMENT,
            usr_email VARCHAR(200) NOT NULL,
            usr_age TINYINT UNSIGNED,
            usr_type VARCHAR(20) NOT NULL,
            usr_address_id BIGINT,
            PRIMARY KEY (usr_id)
        );
        CREATE TABLE address (
            id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
            city VARCHAR(100) NOT NULL
        );
        CREATE TABLE user_role (
            user_id INT UNSIGNED NOT NULL,
            role VARCHAR(20) NOT NULL,
            PRIMARY KEY (user_id, role)
        );
    "#;

    pub(crate) const TABLES: &str = r#"
user:
  comment: { author: jane, copyright: Example Corp }
  class: { classname: User }
  namespace: { entity: crate::entity, mapper: crate::mapper, repository: crate::repository }
  path: { entity: entity, mapper: mapper, repository: repository }
  cache: { prefix: App_User, enabled: true }
  database: { table: user, prefix: usr }
  validation:
    email: email
    age: { type: integer, preset: tinyint_unsigned, allow_null: true }
  joins:
    address:
      config: address
      type: left
      local_field: usr_address_id
      remote_field: id
    roles:
      config: user_role
      relation: many
      type: left
      local_field: usr_id
      remote_field: user_id
address:
  comment: { author: jane, copyright: Example Corp }
  class: { classname: Address }
  namespace: { entity: crate::entity, mapper: crate::mapper }
  path: { entity: entity, mapper: mapper }
  cache: { prefix: App_Address }
  database: { table: address }
user_role:
  comment: { author: jane, copyright: Example Corp }
  class: { classname: UserRole }
  namespace: { entity: crate::entity, mapper: crate::mapper }
  path: { entity: entity, mapper: mapper }
  cache: { prefix: App_UserRole }
  database: { table: user_role }
"#;

    pub(crate) fn raw_configs(dir: &std::path::Path) -> RawConfigs {
        let path = dir.join("tables.yaml");
        fs::write(&path, TABLES).unwrap();
        load_raw_configs(&path).unwrap()
    }

    #[test]
    fn test_table_context_fields() {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw_configs(dir.path()), Some("user"))
            .unwrap();
        let schema = DdlSchema::from_sql(SCHEMA).unwrap();
        let model = configs.get("user").unwrap();
        let context = TableContext::new(model, &schema.describe("user").unwrap()).unwrap();

        let names: Vec<_> = context.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email", "age", "r#type", "address_id"]);
        assert_eq!(context.fields[3].plain_name, "type");
        assert_eq!(context.primary_fields().len(), 1);
        assert_eq!(context.auto_increment_field().unwrap().column, "usr_id");
        assert_eq!(context.fields[2].rust_type.to_type_string(), "Option<u8>");
        assert!(context.fields[1].validation.is_some());
        assert_eq!(context.module_name(), "user");
    }

    #[test]
    fn test_prefix_collision_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw_configs(dir.path()), Some("user"))
            .unwrap();
        let schema = DdlSchema::from_sql(
            "CREATE TABLE user (usr_id INT NOT NULL PRIMARY KEY, id INT NOT NULL);",
        )
        .unwrap();
        let err = TableContext::new(
            configs.get("user").unwrap(),
            &schema.describe("user").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CodegenError::InvalidConfig { ref field, .. } if field == "database.prefix"
        ));
    }

    #[test]
    fn test_unknown_join_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw_configs(dir.path()), Some("user"))
            .unwrap();
        let schema = DdlSchema::from_sql(&SCHEMA.replace("usr_address_id", "usr_home_id")).unwrap();
        let sink = DryRunSink::new();
        let err = Generator::new(&configs, &schema, &sink).run().unwrap_err();
        assert!(matches!(
            err,
            CodegenError::InvalidConfig { ref field, .. } if field == "joins.address.local_field"
        ));
        assert!(sink.written().is_empty());

        let schema = DdlSchema::from_sql(&SCHEMA.replace("user_id INT", "owner_id INT")).unwrap();
        let err = Generator::new(&configs, &schema, &sink).run().unwrap_err();
        assert!(matches!(
            err,
            CodegenError::InvalidConfig { ref field, .. } if field == "joins.roles.remote_field"
        ));
    }

    #[test]
    fn test_run_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigResolver::new()
            .output_root(dir.path())
            .resolve_all(&raw_configs(dir.path()), None)
            .unwrap();
        let schema = DdlSchema::from_sql(SCHEMA).unwrap();
        let report = Generator::new(&configs, &schema, &FileSink::new())
            .run()
            .unwrap();

        assert_eq!(report.tables, vec!["address", "user", "user_role"]);
        // two files per table plus the user repository
        assert_eq!(report.files.len(), 7);
        for file in &report.files {
            assert!(file.exists(), "{} missing", file.display());
        }
        let entity_mod = fs::read_to_string(dir.path().join("entity/mod.rs")).unwrap();
        assert!(entity_mod.contains("pub mod address;\npub mod user;\npub mod user_role;"));
        let mapper_mod = fs::read_to_string(dir.path().join("mapper/mod.rs")).unwrap();
        assert!(mapper_mod.contains("pub mod user_mapper;"));
        assert!(dir.path().join("repository/user_repository.rs").exists());
    }

    #[test]
    fn test_emit_options() {
        let dir = tempfile::tempdir().unwrap();
        let configs = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw_configs(dir.path()), Some("user"))
            .unwrap();
        let schema = DdlSchema::from_sql(SCHEMA).unwrap();
        let sink = DryRunSink::new();
        let report = Generator::new(&configs, &schema, &sink)
            .options(EmitOptions {
                entities: true,
                mappers: false,
                repositories: false,
            })
            .run()
            .unwrap();
        assert_eq!(report.files, vec![PathBuf::from("entity/user.rs")]);
        assert_eq!(sink.written(), report.files);
    }
}
