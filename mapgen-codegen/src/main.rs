//! CLI entry point for mapgen-codegen

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mapgen_codegen::{
    load_raw_configs, open_schema, Artifact, GeneratorSettings, TableContext, TypeRegistry,
};

#[derive(Parser)]
#[command(name = "mapgen-codegen")]
#[command(about = "Generate entity, mapper and repository sources from table schemas")]
#[command(version)]
struct Cli {
    /// Path to settings file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the per-table configuration file (overrides settings)
    #[arg(short, long)]
    tables: Option<PathBuf>,

    /// Path to SQL schema file (overrides settings)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Database URL to introspect instead of a schema file
    #[arg(long)]
    database_url: Option<String>,

    /// Output root that relative artifact paths are joined onto
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Generate only this table configuration
    #[arg(long)]
    table: Option<String>,

    /// Dry run - show what would be generated without writing files
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate all (entities, mappers and repositories)
    Generate,
    /// Generate only entities
    Entities,
    /// Generate only mappers
    Mappers,
    /// Inspect resolved configurations, joins and column types
    Inspect,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load settings first (before logging, so we can use settings.log_level)
    let mut settings = match &cli.config {
        Some(path) => GeneratorSettings::from_file(path)?,
        None => GeneratorSettings::load(None)?,
    };

    // Initialize logging
    // Priority: RUST_LOG env var > settings.log_level > default (debug for dev, info for release)
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let log_level = settings.log_level.as_deref().unwrap_or(default_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    // Apply CLI overrides
    if let Some(tables) = cli.tables {
        settings.tables_file = tables;
    }
    if let Some(schema) = cli.schema {
        settings.schema_file = Some(schema);
        settings.database_url = None;
    }
    if let Some(url) = cli.database_url {
        settings.database_url = Some(url);
        settings.schema_file = None;
    }
    if let Some(output) = cli.output {
        settings.output_root = output;
    }
    if cli.table.is_some() {
        settings.table = cli.table;
    }
    if cli.dry_run {
        settings.dry_run = true;
    }

    // Apply command-specific settings
    match &cli.command {
        Some(Commands::Entities) => {
            settings.generate_mappers = false;
            settings.generate_repositories = false;
        }
        Some(Commands::Mappers) => {
            settings.generate_entities = false;
            settings.generate_repositories = false;
        }
        Some(Commands::Inspect) => {
            return inspect(&settings);
        }
        _ => {}
    }

    info!("Generating code from {}", settings.tables_file.display());
    let report = mapgen_codegen::run(&settings)?;

    if settings.dry_run {
        println!("Dry run mode - would generate:");
        for file in &report.files {
            println!("  {}", file.display());
        }
        return Ok(());
    }

    info!(
        "Code generation completed successfully ({} files)",
        report.files.len()
    );
    Ok(())
}

fn inspect(settings: &GeneratorSettings) -> Result<()> {
    settings.validate()?;
    let raw = load_raw_configs(&settings.tables_file)?;
    let configs = settings
        .resolver()
        .dry_run(true)
        .resolve_all(&raw, settings.table.as_deref())?;
    let schema = open_schema(settings)?;

    println!("Resolved {} configurations:\n", configs.len());
    for model in configs.models() {
        println!("Config: {} ({})", model.name(), model.classname());
        println!("  Table: {}", model.table());
        if !model.table_prefixes().is_empty() {
            println!("  Prefixes: {:?}", model.table_prefixes());
        }
        println!(
            "  Cache: {} ({})",
            model.cache_prefix(),
            if model.cache_enabled() { "enabled" } else { "disabled" }
        );
        for artifact in Artifact::ALL {
            if let (Some(ns), Some(dir)) = (
                model.namespace(artifact),
                configs.artifact_dir(model, artifact),
            ) {
                println!("  {}: {} -> {}", artifact, ns, dir.display());
            }
        }

        let columns = schema.describe(model.table())?;
        let context = TableContext::new(model, &columns)?;
        println!("  Columns:");
        for (column, field) in columns.iter().zip(&context.fields) {
            let column_type = TypeRegistry::resolve(&column.raw_type)?;
            let key = if field.primary { " PRIMARY" } else { "" };
            let auto_inc = if field.auto_increment {
                " AUTO_INCREMENT"
            } else {
                ""
            };
            println!(
                "    - {} {} -> {}: {}{}{}",
                column.field,
                column_type.kind(),
                field.name,
                field.rust_type.to_type_string(),
                key,
                auto_inc
            );
            if !column_type.values().is_empty() {
                println!("      values: {:?}", column_type.values());
            }
            if let Some(rule) = &field.validation {
                println!("      validation: {}", rule.kind);
            }
        }

        if !model.joins().is_empty() {
            println!("  Joins:");
            for join in model.joins() {
                println!(
                    "    - {} -> {} ({}, {}) ON {}.{} = {}.{}",
                    join.alias(),
                    join.target().name(),
                    join.relation(),
                    join.join_type().as_sql(),
                    join.local_alias(),
                    join.local_field(),
                    join.remote_alias(),
                    join.remote_field()
                );
            }
        }
        println!();
    }

    Ok(())
}
