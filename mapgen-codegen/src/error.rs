//! Error types for mapgen-codegen

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for mapgen-codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur during code generation
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Invalid configuration `{config}`: `{field}` {reason}")]
    InvalidConfig {
        config: String,
        field: String,
        reason: String,
    },

    #[error("Unknown SQL type: {0}")]
    UnknownSqlType(String),

    #[error("Invalid SQL type: {0:?}")]
    InvalidSqlType(String),

    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Join `{alias}` of `{config}` targets unknown configuration `{target}`")]
    DanglingJoin {
        config: String,
        alias: String,
        target: String,
    },

    #[error("Unknown table configuration: {0}")]
    UnknownTable(String),

    #[error("Table not found in schema: {0}")]
    MissingTable(String),

    #[error("Failed to parse SQL schema: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Runtime(#[from] mapgen::Error),
}

impl CodegenError {
    /// A required configuration key is missing or empty.
    pub fn missing(config: &str, field: impl Into<String>) -> Self {
        CodegenError::InvalidConfig {
            config: config.to_string(),
            field: field.into(),
            reason: "is required".to_string(),
        }
    }

    /// A configuration key holds a value that cannot be used.
    pub fn invalid(config: &str, field: impl Into<String>, reason: impl Into<String>) -> Self {
        CodegenError::InvalidConfig {
            config: config.to_string(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<sqlparser::parser::ParserError> for CodegenError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        CodegenError::ParseError(err.to_string())
    }
}

impl From<config::ConfigError> for CodegenError {
    fn from(err: config::ConfigError) -> Self {
        CodegenError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = CodegenError::missing("user", "comment.author");
        assert_eq!(
            err.to_string(),
            "Invalid configuration `user`: `comment.author` is required"
        );

        let err = CodegenError::DanglingJoin {
            config: "user".into(),
            alias: "billing".into(),
            target: "address".into(),
        };
        assert!(err.to_string().contains("`billing`"));
        assert!(err.to_string().contains("`address`"));
    }
}
