//! Validated per-table generation contract

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use mapgen::{IntegerPreset, ValidationOptions, ValidatorKind};
use regex::Regex;

use super::join::{DeclaredJoin, JoinDescriptor};
use super::raw::{OneOrMany, RawTableConfig, RawValidationRule};
use crate::error::{CodegenError, Result};

/// The three kinds of generated source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Artifact {
    Entity,
    Mapper,
    Repository,
}

impl Artifact {
    pub const ALL: [Artifact; 3] = [Artifact::Entity, Artifact::Mapper, Artifact::Repository];
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Entity => f.write_str("entity"),
            Artifact::Mapper => f.write_str("mapper"),
            Artifact::Repository => f.write_str("repository"),
        }
    }
}

/// A validator applied by a generated setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRule {
    pub kind: ValidatorKind,
    pub options: ValidationOptions,
}

impl ValidationRule {
    fn build(config: &str, field: &str, raw: &RawValidationRule) -> Result<Self> {
        let key = |name: &str| format!("validation.{}.{}", field, name);
        let spec = match raw {
            RawValidationRule::Kind(kind) => {
                let kind = kind.parse::<ValidatorKind>().map_err(|_| {
                    CodegenError::invalid(
                        config,
                        format!("validation.{}", field),
                        format!("names unknown validator {:?}", kind),
                    )
                })?;
                return Ok(Self {
                    kind,
                    options: default_options(kind),
                });
            }
            RawValidationRule::Detailed(spec) => spec,
        };

        let kind_name = spec
            .kind
            .as_deref()
            .ok_or_else(|| CodegenError::missing(config, key("type")))?;
        let kind = kind_name.parse::<ValidatorKind>().map_err(|_| {
            CodegenError::invalid(
                config,
                key("type"),
                format!("names unknown validator {:?}", kind_name),
            )
        })?;

        let mut options = default_options(kind);
        if let Some(min) = spec.min {
            options = options.min(min);
        }
        if let Some(max) = spec.max {
            options = options.max(max);
        }
        if let Some(preset) = spec.preset.as_deref() {
            let preset = IntegerPreset::from_name(preset).ok_or_else(|| {
                CodegenError::invalid(
                    config,
                    key("preset"),
                    format!("names unknown preset {:?}", preset),
                )
            })?;
            options = options.preset(preset);
        }
        if let Some(pattern) = spec.pattern.as_deref() {
            Regex::new(pattern).map_err(|e| {
                CodegenError::invalid(config, key("pattern"), format!("is not a valid regex: {}", e))
            })?;
            options = options.pattern(pattern);
        }
        if let Some(hostname) = spec.hostname {
            options = options.hostname(hostname);
        }
        if let Some(allow_null) = spec.allow_null {
            options = options.allow_null(allow_null);
        }

        if kind == ValidatorKind::Regexp && options.pattern.is_none() {
            return Err(CodegenError::missing(config, key("pattern")));
        }
        Ok(Self { kind, options })
    }
}

fn default_options(kind: ValidatorKind) -> ValidationOptions {
    match kind {
        ValidatorKind::Email => ValidationOptions::new().hostname(true),
        _ => ValidationOptions::new(),
    }
}

/// One table's full generation contract.
///
/// Built and validated by [`ConfigModel::build`]; the join list is filled in
/// afterwards by the resolver.
#[derive(Debug, Clone)]
pub struct ConfigModel {
    name: String,
    author: String,
    copyright: String,
    classname: String,
    entity_namespace: String,
    mapper_namespace: String,
    repository_namespace: Option<String>,
    entity_path: PathBuf,
    mapper_path: PathBuf,
    repository_path: Option<PathBuf>,
    table: String,
    table_prefixes: Vec<String>,
    cache_prefix: String,
    cache_enabled: bool,
    validation: BTreeMap<String, ValidationRule>,
    declared_joins: Vec<DeclaredJoin>,
    joins: Vec<JoinDescriptor>,
}

impl ConfigModel {
    /// Populate every attribute from `raw` and validate the result.
    pub fn build(name: &str, raw: &RawTableConfig) -> Result<Self> {
        let required = |value: &Option<String>, field: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| CodegenError::missing(name, field))
        };
        let optional = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let author = required(&raw.comment.author, "comment.author")?;
        let copyright = required(&raw.comment.copyright, "comment.copyright")?;
        let classname = required(&raw.class.classname, "class.classname")?;
        let table = required(&raw.database.table, "database.table")?;
        let cache_prefix = required(&raw.cache.prefix, "cache.prefix")?;
        let entity_namespace = required(&raw.namespace.entity, "namespace.entity")?;
        let mapper_namespace = required(&raw.namespace.mapper, "namespace.mapper")?;
        let entity_path = required(&raw.path.entity, "path.entity")?;
        let mapper_path = required(&raw.path.mapper, "path.mapper")?;

        let repository_namespace = optional(&raw.namespace.repository);
        let repository_path = optional(&raw.path.repository);
        if repository_namespace.is_some() != repository_path.is_some() {
            let missing = if repository_namespace.is_some() {
                "path.repository"
            } else {
                "namespace.repository"
            };
            return Err(CodegenError::invalid(
                name,
                missing,
                "is required when the other repository key is set",
            ));
        }

        let table_prefixes = raw
            .database
            .prefix
            .clone()
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|prefix| prefix.trim().to_string())
            .filter(|prefix| !prefix.is_empty())
            .collect();

        let mut validation = BTreeMap::new();
        for (field, rule) in &raw.validation {
            validation.insert(field.clone(), ValidationRule::build(name, field, rule)?);
        }

        let mut declared_joins = Vec::new();
        for (alias, join) in &raw.joins {
            declared_joins.push(DeclaredJoin::build(name, &table, alias, join)?);
        }

        let model = Self {
            name: name.to_string(),
            author,
            copyright,
            classname,
            entity_namespace,
            mapper_namespace,
            repository_namespace,
            entity_path: PathBuf::from(entity_path),
            mapper_path: PathBuf::from(mapper_path),
            repository_path: repository_path.map(PathBuf::from),
            table,
            table_prefixes,
            cache_prefix,
            cache_enabled: raw.cache.enabled.unwrap_or(false),
            validation,
            declared_joins,
            joins: Vec::new(),
        };
        model.validate()?;
        Ok(model)
    }

    /// Check the invariants a model must hold whatever built it.
    pub fn validate(&self) -> Result<()> {
        let required = [
            (&self.author, "comment.author"),
            (&self.copyright, "comment.copyright"),
            (&self.classname, "class.classname"),
            (&self.table, "database.table"),
            (&self.cache_prefix, "cache.prefix"),
            (&self.entity_namespace, "namespace.entity"),
            (&self.mapper_namespace, "namespace.mapper"),
        ];
        for (value, field) in required {
            if value.is_empty() {
                return Err(CodegenError::missing(&self.name, field));
            }
        }
        if self.entity_path.as_os_str().is_empty() {
            return Err(CodegenError::missing(&self.name, "path.entity"));
        }
        if self.mapper_path.as_os_str().is_empty() {
            return Err(CodegenError::missing(&self.name, "path.mapper"));
        }
        if !is_type_name(&self.classname) {
            return Err(CodegenError::invalid(
                &self.name,
                "class.classname",
                format!("{:?} is not a valid type name", self.classname),
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn copyright(&self) -> &str {
        &self.copyright
    }

    pub fn classname(&self) -> &str {
        &self.classname
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn table_prefixes(&self) -> &[String] {
        &self.table_prefixes
    }

    /// The configured cache prefix, lower-cased with `_` replaced by `.`.
    pub fn cache_prefix(&self) -> String {
        self.cache_prefix.to_lowercase().replace('_', ".")
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn validation(&self) -> &BTreeMap<String, ValidationRule> {
        &self.validation
    }

    pub fn validation_for(&self, column: &str) -> Option<&ValidationRule> {
        self.validation.get(column)
    }

    /// Module path the artifact is generated under, e.g. `crate::entity`.
    pub fn namespace(&self, artifact: Artifact) -> Option<&str> {
        match artifact {
            Artifact::Entity => Some(&self.entity_namespace),
            Artifact::Mapper => Some(&self.mapper_namespace),
            Artifact::Repository => self.repository_namespace.as_deref(),
        }
    }

    /// Directory the artifact is written to, as configured.
    pub fn path(&self, artifact: Artifact) -> Option<&Path> {
        match artifact {
            Artifact::Entity => Some(&self.entity_path),
            Artifact::Mapper => Some(&self.mapper_path),
            Artifact::Repository => self.repository_path.as_deref(),
        }
    }

    pub fn has_repository(&self) -> bool {
        self.repository_namespace.is_some()
    }

    /// Full path of the generated entity type.
    pub fn entity_type_path(&self) -> String {
        format!("{}::{}", self.entity_namespace, self.classname)
    }

    pub fn mapper_name(&self) -> String {
        format!("{}Mapper", self.classname)
    }

    pub fn repository_name(&self) -> String {
        format!("{}Repository", self.classname)
    }

    pub fn declared_joins(&self) -> &[DeclaredJoin] {
        &self.declared_joins
    }

    pub fn joins(&self) -> &[JoinDescriptor] {
        &self.joins
    }

    /// Replace the join list.
    pub fn set_join_list(&mut self, joins: Vec<JoinDescriptor>) {
        self.joins = joins;
    }

    /// Strip the first matching table prefix, and a `_` right after it,
    /// from `column`. Columns that would become empty are kept whole.
    pub fn strip_prefix<'a>(&self, column: &'a str) -> &'a str {
        for prefix in &self.table_prefixes {
            if let Some(rest) = column.strip_prefix(prefix.as_str()) {
                let rest = rest.strip_prefix('_').unwrap_or(rest);
                if !rest.is_empty() {
                    return rest;
                }
            }
        }
        column
    }
}

fn is_type_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::raw::{RawJoin, RawRuleSpec};

    /// A raw config with every required key set.
    pub(crate) fn full_raw(table: &str, classname: &str) -> RawTableConfig {
        let mut raw = RawTableConfig::default();
        raw.comment.author = Some("jane".into());
        raw.comment.copyright = Some("Example Corp".into());
        raw.class.classname = Some(classname.into());
        raw.namespace.entity = Some("crate::entity".into());
        raw.namespace.mapper = Some("crate::mapper".into());
        raw.path.entity = Some("src/entity".into());
        raw.path.mapper = Some("src/mapper".into());
        raw.cache.prefix = Some(format!("App_{}", table));
        raw.database.table = Some(table.into());
        raw
    }

    #[test]
    fn test_build_full() {
        let model = ConfigModel::build("user", &full_raw("user", "User")).unwrap();
        assert_eq!(model.classname(), "User");
        assert_eq!(model.table(), "user");
        assert_eq!(model.cache_prefix(), "app.user");
        assert!(!model.cache_enabled());
        assert!(!model.has_repository());
        assert_eq!(model.entity_type_path(), "crate::entity::User");
        assert_eq!(model.path(Artifact::Mapper), Some(Path::new("src/mapper")));
        assert!(model.joins().is_empty());
    }

    #[test]
    fn test_each_required_field_is_named() {
        type Clear = fn(&mut RawTableConfig);
        let cases: [(&str, Clear); 9] = [
            ("comment.author", |r| r.comment.author = None),
            ("comment.copyright", |r| r.comment.copyright = None),
            ("class.classname", |r| r.class.classname = None),
            ("database.table", |r| r.database.table = None),
            ("cache.prefix", |r| r.cache.prefix = Some(" ".into())),
            ("namespace.entity", |r| r.namespace.entity = None),
            ("namespace.mapper", |r| r.namespace.mapper = None),
            ("path.entity", |r| r.path.entity = None),
            ("path.mapper", |r| r.path.mapper = Some(String::new())),
        ];
        for (expected, clear) in cases {
            let mut raw = full_raw("user", "User");
            clear(&mut raw);
            match ConfigModel::build("user", &raw) {
                Err(CodegenError::InvalidConfig { config, field, .. }) => {
                    assert_eq!(config, "user");
                    assert_eq!(field, expected);
                }
                other => panic!("{}: unexpected {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_repository_keys_come_in_pairs() {
        let mut raw = full_raw("user", "User");
        raw.namespace.repository = Some("crate::repository".into());
        let err = ConfigModel::build("user", &raw).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::InvalidConfig { ref field, .. } if field == "path.repository"
        ));

        raw.path.repository = Some("src/repository".into());
        assert!(ConfigModel::build("user", &raw).unwrap().has_repository());
    }

    #[test]
    fn test_prefixes() {
        let mut raw = full_raw("user", "User");
        raw.database.prefix = Some(OneOrMany::One("usr".into()));
        let model = ConfigModel::build("user", &raw).unwrap();
        assert_eq!(model.table_prefixes(), ["usr"]);
        assert_eq!(model.strip_prefix("usr_email"), "email");
        assert_eq!(model.strip_prefix("usrname"), "name");
        assert_eq!(model.strip_prefix("usr"), "usr");
        assert_eq!(model.strip_prefix("email"), "email");

        raw.database.prefix = Some(OneOrMany::Many(vec!["a".into(), "ab".into()]));
        let model = ConfigModel::build("user", &raw).unwrap();
        assert_eq!(model.strip_prefix("ab_x"), "b_x");
    }

    #[test]
    fn test_validation_rules() {
        let mut raw = full_raw("user", "User");
        raw.validation
            .insert("email".into(), RawValidationRule::Kind("email".into()));
        raw.validation.insert(
            "age".into(),
            RawValidationRule::Detailed(RawRuleSpec {
                kind: Some("integer".into()),
                preset: Some("tinyint_unsigned".into()),
                ..Default::default()
            }),
        );
        let model = ConfigModel::build("user", &raw).unwrap();
        let email = model.validation_for("email").unwrap();
        assert_eq!(email.kind, ValidatorKind::Email);
        assert!(email.options.hostname);
        assert_eq!(
            model.validation_for("age").unwrap().options.preset,
            Some(IntegerPreset::TinyIntUnsigned)
        );

        raw.validation.insert(
            "code".into(),
            RawValidationRule::Detailed(RawRuleSpec {
                kind: Some("regexp".into()),
                ..Default::default()
            }),
        );
        let err = ConfigModel::build("user", &raw).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::InvalidConfig { ref field, .. } if field == "validation.code.pattern"
        ));
    }

    #[test]
    fn test_declared_joins_are_validated() {
        let mut raw = full_raw("user", "User");
        raw.joins.insert(
            "billing".into(),
            RawJoin {
                config: Some("address".into()),
                local_field: Some("address_id".into()),
                ..Default::default()
            },
        );
        let err = ConfigModel::build("user", &raw).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::InvalidConfig { ref field, .. } if field == "joins.billing.remote_field"
        ));
    }
}
