//! Raw per-table configuration, as written in the tables file

use std::collections::BTreeMap;
use std::path::Path;

use config::{Config, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Every table configuration, keyed by config name.
pub type RawConfigs = BTreeMap<String, RawTableConfig>;

/// One entry of the tables file.
///
/// ```yaml
/// user:
///   comment: { author: jane, copyright: Example Corp }
///   class: { classname: User }
///   namespace: { entity: crate::entity, mapper: crate::mapper }
///   path: { entity: src/entity, mapper: src/mapper }
///   cache: { prefix: app_user, enabled: true }
///   database: { table: user, prefix: usr }
///   validation:
///     email: email
///     age: { type: integer, preset: tinyint_unsigned }
///   joins:
///     billing: { config: address, local_field: address_id, remote_field: id, type: left }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTableConfig {
    #[serde(default)]
    pub comment: RawComment,
    #[serde(default)]
    pub class: RawClass,
    #[serde(default)]
    pub namespace: RawArtifacts,
    #[serde(default)]
    pub path: RawArtifacts,
    #[serde(default)]
    pub cache: RawCache,
    #[serde(default)]
    pub database: RawDatabase,
    #[serde(default)]
    pub validation: BTreeMap<String, RawValidationRule>,
    #[serde(default)]
    pub joins: BTreeMap<String, RawJoin>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawComment {
    pub author: Option<String>,
    pub copyright: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawClass {
    pub classname: Option<String>,
}

/// Per-artifact values, used for both `namespace` and `path`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawArtifacts {
    pub entity: Option<String>,
    pub mapper: Option<String>,
    pub repository: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCache {
    pub prefix: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDatabase {
    pub table: Option<String>,
    pub prefix: Option<OneOrMany>,
}

/// A scalar or a list, for keys that accept either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// A validation rule: just the validator name, or a table of options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValidationRule {
    Kind(String),
    Detailed(RawRuleSpec),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRuleSpec {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub preset: Option<String>,
    pub pattern: Option<String>,
    pub hostname: Option<bool>,
    pub allow_null: Option<bool>,
}

/// A join declaration, keyed by its alias in `joins`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawJoin {
    /// Name of the joined table's configuration.
    pub config: Option<String>,
    /// `one` (default) or `many`.
    pub relation: Option<String>,
    /// `inner` (default), `left`, `right` or `full`.
    #[serde(rename = "type")]
    pub join_type: Option<String>,
    pub local_field: Option<String>,
    pub local_alias: Option<String>,
    pub remote_field: Option<String>,
    pub remote_alias: Option<String>,
}

/// Load a tables file (YAML, TOML or JSON, by extension).
pub fn load_raw_configs(path: &Path) -> Result<RawConfigs> {
    let raw: RawConfigs = Config::builder()
        .add_source(File::from(path))
        .build()?
        .try_deserialize()?;
    debug!("Loaded {} table configurations from {:?}", raw.len(), path);
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.yaml");
        std::fs::write(
            &path,
            r#"
user:
  comment:
    author: jane
    copyright: Example Corp
  class:
    classname: User
  database:
    table: user
    prefix: usr
  validation:
    email: email
    age:
      type: integer
      preset: tinyint_unsigned
  joins:
    billing:
      config: address
      type: left
"#,
        )
        .unwrap();

        let raw = load_raw_configs(&path).unwrap();
        let user = &raw["user"];
        assert_eq!(user.comment.author.as_deref(), Some("jane"));
        assert_eq!(
            user.database.prefix.clone().map(OneOrMany::into_vec),
            Some(vec!["usr".to_string()])
        );
        assert_eq!(
            user.validation["email"],
            RawValidationRule::Kind("email".into())
        );
        match &user.validation["age"] {
            RawValidationRule::Detailed(spec) => {
                assert_eq!(spec.kind.as_deref(), Some("integer"));
                assert_eq!(spec.preset.as_deref(), Some("tinyint_unsigned"));
            }
            other => panic!("unexpected rule {:?}", other),
        }
        assert_eq!(user.joins["billing"].join_type.as_deref(), Some("left"));
    }

    #[test]
    fn test_prefix_list_from_toml() {
        let raw: RawTableConfig = toml::from_str(
            r#"
            [database]
            table = "member"
            prefix = ["mb", "member"]
        "#,
        )
        .unwrap();
        assert_eq!(
            raw.database.prefix.map(OneOrMany::into_vec),
            Some(vec!["mb".to_string(), "member".to_string()])
        );
    }
}
