//! Generator settings for mapgen-codegen

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults;
use super::resolver::{ConfigResolver, DanglingJoinPolicy};
use crate::error::{CodegenError, Result};

/// Settings of one generator run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Path to the per-table configuration file (YAML or TOML)
    #[serde(default = "default_tables_file")]
    pub tables_file: PathBuf,

    /// Path to a SQL schema file with CREATE TABLE statements
    #[serde(default)]
    pub schema_file: Option<PathBuf>,

    /// Database URL to introspect instead of a schema file
    #[serde(default)]
    pub database_url: Option<String>,

    /// Generate only this table configuration
    #[serde(default)]
    pub table: Option<String>,

    /// Root that relative entity/mapper/repository paths are joined onto
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Whether to generate entity files
    #[serde(default = "default_generate_entities")]
    pub generate_entities: bool,

    /// Whether to generate mapper files
    #[serde(default = "default_generate_mappers")]
    pub generate_mappers: bool,

    /// Whether to generate repository files
    #[serde(default = "default_generate_repositories")]
    pub generate_repositories: bool,

    /// What to do with joins whose target is not configured
    #[serde(default = "default_dangling_joins")]
    pub dangling_joins: DanglingJoinPolicy,

    /// Dry run mode - preview without writing files
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    /// Can be overridden by RUST_LOG env var
    #[serde(default)]
    pub log_level: Option<String>,
}

// Default value functions for serde
fn default_tables_file() -> PathBuf {
    PathBuf::from(defaults::TABLES_FILE)
}
fn default_output_root() -> PathBuf {
    PathBuf::from(defaults::OUTPUT_ROOT)
}
fn default_generate_entities() -> bool {
    defaults::GENERATE_ENTITIES
}
fn default_generate_mappers() -> bool {
    defaults::GENERATE_MAPPERS
}
fn default_generate_repositories() -> bool {
    defaults::GENERATE_REPOSITORIES
}
fn default_dangling_joins() -> DanglingJoinPolicy {
    defaults::DANGLING_JOINS.parse().unwrap_or_default()
}
fn default_dry_run() -> bool {
    defaults::DRY_RUN
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            tables_file: default_tables_file(),
            schema_file: None,
            database_url: None,
            table: None,
            output_root: default_output_root(),
            generate_entities: default_generate_entities(),
            generate_mappers: default_generate_mappers(),
            generate_repositories: default_generate_repositories(),
            dangling_joins: default_dangling_joins(),
            dry_run: default_dry_run(),
            log_level: None,
        }
    }
}

impl GeneratorSettings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: GeneratorSettings = toml::from_str(&content).map_err(|e| {
            CodegenError::ConfigError(format!(
                "Failed to parse settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(settings)
    }

    /// Load settings using config-rs (file + environment variables)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        } else {
            builder = builder.add_source(File::with_name("mapgen-codegen").required(false));
        }

        // Override with environment variables (MAPGEN_*), e.g. MAPGEN_DRY_RUN
        builder = builder.add_source(Environment::with_prefix("MAPGEN").try_parsing(true));

        let settings: GeneratorSettings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.tables_file.as_os_str().is_empty() {
            return Err(CodegenError::ValidationError("tables_file is required".into()));
        }
        if !self.tables_file.exists() {
            return Err(CodegenError::ValidationError(format!(
                "Tables file not found: {}",
                self.tables_file.display()
            )));
        }

        match (&self.schema_file, &self.database_url) {
            (None, None) => {
                return Err(CodegenError::ValidationError(
                    "either schema_file or database_url is required".into(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(CodegenError::ValidationError(
                    "schema_file and database_url are mutually exclusive".into(),
                ));
            }
            (Some(schema), None) if !schema.exists() => {
                return Err(CodegenError::ValidationError(format!(
                    "Schema file not found: {}",
                    schema.display()
                )));
            }
            _ => {}
        }

        if !(self.generate_entities || self.generate_mappers || self.generate_repositories) {
            return Err(CodegenError::ValidationError(
                "at least one of generate_entities, generate_mappers and generate_repositories must be true".into(),
            ));
        }

        Ok(())
    }

    /// A resolver configured from these settings
    pub fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new()
            .output_root(&self.output_root)
            .dangling_joins(self.dangling_joins)
            .dry_run(self.dry_run)
    }
}
