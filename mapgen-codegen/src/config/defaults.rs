//! Default configuration values - single source of truth

/// Default tables file, next to the working directory
pub const TABLES_FILE: &str = "mapgen-tables.yaml";

/// Default output root that relative artifact paths are joined onto
pub const OUTPUT_ROOT: &str = ".";

/// Whether to generate entity files by default
pub const GENERATE_ENTITIES: bool = true;

/// Whether to generate mapper files by default
pub const GENERATE_MAPPERS: bool = true;

/// Whether to generate repository files by default
pub const GENERATE_REPOSITORIES: bool = true;

/// Default handling of joins whose target is not configured
pub const DANGLING_JOINS: &str = "ignore";

/// Whether to run in dry-run mode by default
pub const DRY_RUN: bool = false;
