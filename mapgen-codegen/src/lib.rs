//! mapgen-codegen: Generate entity, mapper and repository sources from table
//! schemas and per-table configuration
//!
//! This crate provides both a CLI tool and a library. For every configured
//! table it describes the columns (from `CREATE TABLE` DDL parsed with
//! `sqlparser-rs`, or from a live MySQL database), maps their types and
//! renders:
//!
//! - an entity struct with getters, validating setters and `mapgen::Entity`
//! - a mapper over any `mapgen::Executor`, with key lookups, caching and joins
//! - an optional repository trait the mapper implements
//!
//! # Table configuration
//!
//! ```yaml
//! user:
//!   comment: { author: jane, copyright: Example Corp }
//!   class: { classname: User }
//!   namespace: { entity: crate::entity, mapper: crate::mapper }
//!   path: { entity: src/entity, mapper: src/mapper }
//!   cache: { prefix: App_User, enabled: true }
//!   database: { table: user, prefix: usr }
//!   validation:
//!     email: email
//!   joins:
//!     address: { config: address, type: left, local_field: usr_address_id, remote_field: id }
//! ```
//!
//! # Usage in build.rs
//!
//! ```rust,ignore
//! fn main() {
//!     let out_dir = std::env::var("OUT_DIR").unwrap();
//!     mapgen_codegen::GeneratorBuilder::new("tables.yaml")
//!         .schema_file("schema.sql")
//!         .output_root(&out_dir)
//!         .generate()
//!         .expect("Failed to generate mapgen code");
//!
//!     println!("cargo:rerun-if-changed=tables.yaml");
//!     println!("cargo:rerun-if-changed=schema.sql");
//! }
//! ```
//!
//! or configure `[package.metadata.mapgen-codegen]` and call
//! [`generate_from_cargo_metadata`].
//!
//! # CLI Usage
//!
//! ```bash
//! mapgen-codegen --tables tables.yaml --schema schema.sql --output ./src generate
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod schema;
pub mod types;

use std::path::{Path, PathBuf};

use tracing::info;

pub use codegen::{
    CodeSink, DryRunSink, EmitOptions, FileSink, GenerationReport, Generator, TableContext,
};
pub use config::{
    load_raw_configs, Artifact, ConfigModel, ConfigResolver, DanglingJoinPolicy,
    GeneratorSettings, RawConfigs, ResolvedConfigs,
};
pub use error::{CodegenError, Result};
pub use schema::{ColumnDescriptor, DdlSchema, KeyRole, LiveSchema, SchemaSource};
pub use types::{ColumnKind, ColumnType, RustType, TypeRegistry};

/// Resolve `raw` and generate every configuration (or only `filter`).
///
/// Nothing is written unless every table renders; with `settings.dry_run`
/// the target paths are only logged.
pub fn generate(
    schema: &dyn SchemaSource,
    raw: &RawConfigs,
    filter: Option<&str>,
    settings: &GeneratorSettings,
) -> Result<GenerationReport> {
    let configs = settings.resolver().resolve_all(raw, filter)?;
    let options = EmitOptions {
        entities: settings.generate_entities,
        mappers: settings.generate_mappers,
        repositories: settings.generate_repositories,
    };

    if settings.dry_run {
        let sink = DryRunSink::new();
        Generator::new(&configs, schema, &sink).options(options).run()
    } else {
        Generator::new(&configs, schema, &FileSink::new())
            .options(options)
            .run()
    }
}

/// Load the tables file and schema named by `settings` and generate.
pub fn run(settings: &GeneratorSettings) -> Result<GenerationReport> {
    settings.validate()?;
    info!("Loading table configurations: {}", settings.tables_file.display());
    let raw = load_raw_configs(&settings.tables_file)?;
    info!("Found {} table configurations", raw.len());

    let schema = open_schema(settings)?;
    generate(schema.as_ref(), &raw, settings.table.as_deref(), settings)
}

/// The schema source `settings` points at: a DDL file or a live database.
pub fn open_schema(settings: &GeneratorSettings) -> Result<Box<dyn SchemaSource>> {
    if let Some(path) = &settings.schema_file {
        info!("Parsing schema: {}", path.display());
        return Ok(Box::new(DdlSchema::from_file(path)?));
    }
    match &settings.database_url {
        Some(url) => open_database(url),
        None => Err(CodegenError::ValidationError(
            "either schema_file or database_url is required".into(),
        )),
    }
}

#[cfg(feature = "mysql")]
fn open_database(url: &str) -> Result<Box<dyn SchemaSource>> {
    info!("Introspecting live database");
    Ok(Box::new(LiveSchema::connect(url)?))
}

#[cfg(not(feature = "mysql"))]
fn open_database(_url: &str) -> Result<Box<dyn SchemaSource>> {
    Err(CodegenError::ConfigError(
        "database_url needs the `mysql` feature of mapgen-codegen".into(),
    ))
}

/// Builder pattern for easy configuration in build.rs
pub struct GeneratorBuilder {
    settings: GeneratorSettings,
}

impl GeneratorBuilder {
    /// Create a new builder with the given tables file
    pub fn new(tables_file: impl AsRef<Path>) -> Self {
        Self {
            settings: GeneratorSettings {
                tables_file: tables_file.as_ref().to_path_buf(),
                ..Default::default()
            },
        }
    }

    /// Describe tables from a SQL DDL file
    pub fn schema_file(mut self, path: impl AsRef<Path>) -> Self {
        self.settings.schema_file = Some(path.as_ref().to_path_buf());
        self.settings.database_url = None;
        self
    }

    /// Describe tables by introspecting a live database
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.settings.database_url = Some(url.into());
        self.settings.schema_file = None;
        self
    }

    /// Set the root that relative artifact paths are joined onto
    pub fn output_root(mut self, dir: impl AsRef<Path>) -> Self {
        self.settings.output_root = dir.as_ref().to_path_buf();
        self
    }

    /// Generate only one table configuration
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.settings.table = Some(name.into());
        self
    }

    /// Generate only entities
    pub fn entities_only(mut self) -> Self {
        self.settings.generate_mappers = false;
        self.settings.generate_repositories = false;
        self
    }

    /// Generate only mappers
    pub fn mappers_only(mut self) -> Self {
        self.settings.generate_entities = false;
        self.settings.generate_repositories = false;
        self
    }

    /// Skip repository traits
    pub fn without_repositories(mut self) -> Self {
        self.settings.generate_repositories = false;
        self
    }

    /// Set what happens to joins whose target is not configured
    pub fn dangling_joins(mut self, policy: DanglingJoinPolicy) -> Self {
        self.settings.dangling_joins = policy;
        self
    }

    /// Enable dry run mode (preview without writing files)
    pub fn dry_run(mut self) -> Self {
        self.settings.dry_run = true;
        self
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Generate the code
    pub fn generate(self) -> Result<GenerationReport> {
        run(&self.settings)
    }
}

/// Configuration for `[package.metadata.mapgen-codegen]` in Cargo.toml
#[derive(Debug, Clone, Default, serde::Deserialize)]
struct CargoMetadataConfig {
    /// Path to the table configuration file (required)
    tables_file: Option<String>,

    /// Path to the SQL schema file (required)
    schema_file: Option<String>,

    /// Generate only this table configuration
    table: Option<String>,

    /// Output root (default: OUT_DIR)
    output_root: Option<String>,

    /// Whether to generate repository traits (default: true)
    generate_repositories: Option<bool>,

    /// Dangling join policy (default: ignore)
    dangling_joins: Option<DanglingJoinPolicy>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoToml {
    package: Option<CargoPackage>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackage {
    metadata: Option<CargoPackageMetadata>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackageMetadata {
    #[serde(rename = "mapgen-codegen")]
    mapgen_codegen: Option<CargoMetadataConfig>,
}

/// Generate code from `[package.metadata.mapgen-codegen]` in Cargo.toml
///
/// ```toml
/// [package.metadata.mapgen-codegen]
/// tables_file = "tables.yaml"
/// schema_file = "schema.sql"
/// ```
pub fn generate_from_cargo_metadata() -> Result<GenerationReport> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").map_err(|_| {
        CodegenError::ConfigError(
            "CARGO_MANIFEST_DIR not set - are you running from build.rs?".into(),
        )
    })?;
    let manifest_dir = PathBuf::from(manifest_dir);

    let cargo_toml_path = manifest_dir.join("Cargo.toml");
    let cargo_toml_content = std::fs::read_to_string(&cargo_toml_path)?;
    let cargo_toml: CargoToml = toml::from_str(&cargo_toml_content).map_err(|e| {
        CodegenError::ConfigError(format!(
            "Failed to parse {}: {}",
            cargo_toml_path.display(),
            e
        ))
    })?;

    let metadata_config = cargo_toml
        .package
        .and_then(|p| p.metadata)
        .and_then(|m| m.mapgen_codegen)
        .ok_or_else(|| {
            CodegenError::ConfigError(
                "Missing [package.metadata.mapgen-codegen] section in Cargo.toml".into(),
            )
        })?;

    let tables_file = metadata_config.tables_file.ok_or_else(|| {
        CodegenError::ConfigError(
            "tables_file is required in [package.metadata.mapgen-codegen]".into(),
        )
    })?;
    let schema_file = metadata_config.schema_file.ok_or_else(|| {
        CodegenError::ConfigError(
            "schema_file is required in [package.metadata.mapgen-codegen]".into(),
        )
    })?;
    let tables_path = manifest_dir.join(tables_file);
    let schema_path = manifest_dir.join(schema_file);

    let output_root = match metadata_config.output_root {
        Some(root) => manifest_dir.join(root),
        None => std::env::var("OUT_DIR").map(PathBuf::from).map_err(|_| {
            CodegenError::ConfigError("OUT_DIR not set - are you running from build.rs?".into())
        })?,
    };

    let mut builder = GeneratorBuilder::new(&tables_path)
        .schema_file(&schema_path)
        .output_root(output_root);
    if let Some(table) = metadata_config.table {
        builder = builder.table(table);
    }
    if let Some(false) = metadata_config.generate_repositories {
        builder = builder.without_repositories();
    }
    if let Some(policy) = metadata_config.dangling_joins {
        builder = builder.dangling_joins(policy);
    }

    // Emit rerun-if-changed
    println!("cargo:rerun-if-changed={}", tables_path.display());
    println!("cargo:rerun-if-changed={}", schema_path.display());
    println!("cargo:rerun-if-changed={}", cargo_toml_path.display());

    builder.generate()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::codegen::tests::{SCHEMA, TABLES};

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tables.yaml"), TABLES).unwrap();
        fs::write(dir.path().join("schema.sql"), SCHEMA).unwrap();
        dir
    }

    #[test]
    fn test_builder_generates_into_output_root() {
        let dir = fixture_dir();
        let out = dir.path().join("out");
        let report = GeneratorBuilder::new(dir.path().join("tables.yaml"))
            .schema_file(dir.path().join("schema.sql"))
            .output_root(&out)
            .generate()
            .unwrap();

        assert_eq!(report.tables.len(), 3);
        assert!(out.join("entity/user.rs").exists());
        assert!(out.join("mapper/user_role_mapper.rs").exists());
        assert!(out.join("repository/user_repository.rs").exists());
        assert!(out.join("entity/mod.rs").exists());
    }

    #[test]
    fn test_filter_and_entities_only() {
        let dir = fixture_dir();
        let out = dir.path().join("out");
        let report = GeneratorBuilder::new(dir.path().join("tables.yaml"))
            .schema_file(dir.path().join("schema.sql"))
            .output_root(&out)
            .table("address")
            .entities_only()
            .generate()
            .unwrap();

        assert_eq!(report.tables, vec!["address"]);
        assert_eq!(report.files, vec![out.join("entity/address.rs")]);
        assert!(!out.join("mapper/address_mapper.rs").exists());
    }

    #[test]
    fn test_unknown_filter_fails() {
        let dir = fixture_dir();
        let err = GeneratorBuilder::new(dir.path().join("tables.yaml"))
            .schema_file(dir.path().join("schema.sql"))
            .output_root(dir.path().join("out"))
            .table("ghost")
            .generate()
            .unwrap_err();
        assert!(matches!(err, CodegenError::UnknownTable(ref name) if name == "ghost"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = fixture_dir();
        let out = dir.path().join("out");
        let report = GeneratorBuilder::new(dir.path().join("tables.yaml"))
            .schema_file(dir.path().join("schema.sql"))
            .output_root(&out)
            .dry_run()
            .generate()
            .unwrap();
        assert_eq!(report.files.len(), 7);
        assert!(!out.exists());
    }

    #[test]
    fn test_missing_table_in_schema() {
        let dir = fixture_dir();
        fs::write(
            dir.path().join("schema.sql"),
            "CREATE TABLE user (usr_id INT NOT NULL PRIMARY KEY);",
        )
        .unwrap();
        let err = GeneratorBuilder::new(dir.path().join("tables.yaml"))
            .schema_file(dir.path().join("schema.sql"))
            .output_root(dir.path().join("out"))
            .dry_run()
            .generate()
            .unwrap_err();
        assert!(matches!(err, CodegenError::MissingTable(ref name) if name == "address"));
    }
}
