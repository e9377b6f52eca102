//! Turns raw table configurations into linked config models

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::join::JoinDescriptor;
use super::model::{Artifact, ConfigModel};
use super::raw::RawConfigs;
use crate::error::{CodegenError, Result};

/// What to do with a join whose target configuration does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingJoinPolicy {
    /// Drop the join, logging at debug level.
    #[default]
    Ignore,
    /// Drop the join, logging a warning.
    Warn,
    /// Abort resolution with `DanglingJoin`.
    Fail,
}

impl FromStr for DanglingJoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(DanglingJoinPolicy::Ignore),
            "warn" => Ok(DanglingJoinPolicy::Warn),
            "fail" => Ok(DanglingJoinPolicy::Fail),
            other => Err(format!(
                "unknown dangling join policy {:?} (expected ignore, warn or fail)",
                other
            )),
        }
    }
}

impl fmt::Display for DanglingJoinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DanglingJoinPolicy::Ignore => f.write_str("ignore"),
            DanglingJoinPolicy::Warn => f.write_str("warn"),
            DanglingJoinPolicy::Fail => f.write_str("fail"),
        }
    }
}

/// Builds one [`ConfigModel`] per configuration and wires their joins.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    output_root: Option<PathBuf>,
    dangling_joins: DanglingJoinPolicy,
    dry_run: bool,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join relative artifact paths onto `root`.
    pub fn output_root(mut self, root: impl AsRef<Path>) -> Self {
        self.output_root = Some(root.as_ref().to_path_buf());
        self
    }

    pub fn dangling_joins(mut self, policy: DanglingJoinPolicy) -> Self {
        self.dangling_joins = policy;
        self
    }

    /// Skip creating output directories.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolve every configuration in `raw`.
    ///
    /// With a `filter`, only that configuration is returned; join targets
    /// still come from the complete set. A `filter` naming no configuration
    /// fails with `UnknownTable` rather than resolving nothing. Only the
    /// filtered configuration and its join targets must be valid: any other
    /// configuration that fails to build is skipped with a warning.
    pub fn resolve_all(&self, raw: &RawConfigs, filter: Option<&str>) -> Result<ResolvedConfigs> {
        if let Some(filter) = filter {
            if !raw.contains_key(filter) {
                return Err(CodegenError::UnknownTable(filter.to_string()));
            }
        }
        let required: Option<Vec<&str>> = filter.map(|name| required_configs(raw, name));

        let mut models = BTreeMap::new();
        let mut base = BTreeMap::new();
        for (name, table) in raw {
            let model = match (ConfigModel::build(name, table), &required) {
                (Ok(model), _) => model,
                (Err(e), Some(required)) if !required.contains(&name.as_str()) => {
                    warn!("Skipping config {}: {}", name, e);
                    continue;
                }
                (Err(e), _) => return Err(e),
            };
            base.insert(name.clone(), Arc::new(model.clone()));
            models.insert(name.clone(), model);
        }
        debug!("Built {} config models", models.len());

        for (name, model) in models.iter_mut() {
            if model.declared_joins().is_empty() || filter.is_some_and(|f| f != name.as_str()) {
                continue;
            }
            let mut joins = Vec::new();
            for declared in model.declared_joins() {
                match base.get(&declared.target) {
                    Some(target) => {
                        joins.push(JoinDescriptor::new(declared.clone(), Arc::clone(target)));
                    }
                    None => self.dangling(model.name(), &declared.alias, &declared.target)?,
                }
            }
            model.set_join_list(joins);
        }

        let resolved = ResolvedConfigs {
            models,
            base,
            output_root: self.output_root.clone(),
        };
        if !self.dry_run {
            resolved.create_output_dirs()?;
        }

        let resolved = match filter {
            Some(filter) => resolved.narrow(filter),
            None => resolved,
        };
        info!("Resolved {} table configurations", resolved.len());
        Ok(resolved)
    }

    fn dangling(&self, config: &str, alias: &str, target: &str) -> Result<()> {
        match self.dangling_joins {
            DanglingJoinPolicy::Ignore => {
                debug!(
                    "Dropping join {} of {}: no configuration named {}",
                    alias, config, target
                );
                Ok(())
            }
            DanglingJoinPolicy::Warn => {
                warn!(
                    "Dropping join {} of {}: no configuration named {}",
                    alias, config, target
                );
                Ok(())
            }
            DanglingJoinPolicy::Fail => Err(CodegenError::DanglingJoin {
                config: config.to_string(),
                alias: alias.to_string(),
                target: target.to_string(),
            }),
        }
    }
}

/// `name` plus the configurations its joins point at.
fn required_configs<'a>(raw: &'a RawConfigs, name: &'a str) -> Vec<&'a str> {
    let mut required = vec![name];
    if let Some(table) = raw.get(name) {
        required.extend(table.joins.values().filter_map(|join| join.config.as_deref()));
    }
    required
}

/// The outcome of [`ConfigResolver::resolve_all`].
#[derive(Debug, Clone)]
pub struct ResolvedConfigs {
    models: BTreeMap<String, ConfigModel>,
    base: BTreeMap<String, Arc<ConfigModel>>,
    output_root: Option<PathBuf>,
}

impl ResolvedConfigs {
    /// Models to generate, in name order.
    pub fn models(&self) -> impl Iterator<Item = &ConfigModel> {
        self.models.values()
    }

    pub fn get(&self, name: &str) -> Option<&ConfigModel> {
        self.models.get(name)
    }

    /// Join target model, never carrying joins itself.
    pub fn base(&self, name: &str) -> Option<&Arc<ConfigModel>> {
        self.base.get(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Output directory of `artifact` for `model`, joined onto the output
    /// root when the configured path is relative.
    pub fn artifact_dir(&self, model: &ConfigModel, artifact: Artifact) -> Option<PathBuf> {
        let path = model.path(artifact)?;
        Some(match &self.output_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }

    fn create_output_dirs(&self) -> Result<()> {
        for model in self.models.values() {
            for artifact in Artifact::ALL {
                let Some(dir) = self.artifact_dir(model, artifact) else {
                    continue;
                };
                std::fs::create_dir_all(&dir).map_err(|source| CodegenError::OutputDirectory {
                    path: dir.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    fn narrow(mut self, name: &str) -> Self {
        self.models.retain(|key, _| key == name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::join::Relation;
    use crate::config::model::tests::full_raw;
    use crate::config::raw::{RawJoin, RawTableConfig};

    fn with_join(table: &str, classname: &str, alias: &str, target: &str) -> RawTableConfig {
        let mut raw = full_raw(table, classname);
        raw.joins.insert(
            alias.into(),
            RawJoin {
                config: Some(target.into()),
                relation: Some("one".into()),
                join_type: Some("left".into()),
                local_field: Some("address_id".into()),
                remote_field: Some("id".into()),
                ..Default::default()
            },
        );
        raw
    }

    fn raw_set() -> RawConfigs {
        let mut raw = RawConfigs::new();
        raw.insert("user".into(), with_join("user", "User", "billing", "address"));
        raw.insert("address".into(), full_raw("address", "Address"));
        raw
    }

    #[test]
    fn test_join_is_wired_to_base_model() {
        let resolved = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw_set(), None)
            .unwrap();
        assert_eq!(resolved.len(), 2);

        let user = resolved.get("user").unwrap();
        assert_eq!(user.joins().len(), 1);
        let join = &user.joins()[0];
        assert_eq!(join.alias(), "billing");
        assert_eq!(join.relation(), Relation::One);
        assert_eq!(join.target().classname(), "Address");
        assert_eq!(join.target().table(), "address");
        assert!(join.target().joins().is_empty());
        assert!(Arc::ptr_eq(
            join.target_arc(),
            resolved.base("address").unwrap()
        ));
    }

    #[test]
    fn test_dangling_join_is_dropped() {
        let mut raw = RawConfigs::new();
        raw.insert("user".into(), with_join("user", "User", "billing", "nowhere"));

        let resolved = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw, None)
            .unwrap();
        assert!(resolved.get("user").unwrap().joins().is_empty());

        let resolved = ConfigResolver::new()
            .dry_run(true)
            .dangling_joins(DanglingJoinPolicy::Warn)
            .resolve_all(&raw, None)
            .unwrap();
        assert!(resolved.get("user").unwrap().joins().is_empty());

        let err = ConfigResolver::new()
            .dry_run(true)
            .dangling_joins(DanglingJoinPolicy::Fail)
            .resolve_all(&raw, None)
            .unwrap_err();
        assert!(matches!(err, CodegenError::DanglingJoin { ref target, .. } if target == "nowhere"));
    }

    #[test]
    fn test_filter_keeps_join_targets() {
        let resolved = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw_set(), Some("user"))
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved.get("address").is_none());
        assert!(resolved.base("address").is_some());
        assert_eq!(resolved.get("user").unwrap().joins().len(), 1);

        let err = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw_set(), Some("missing"))
            .unwrap_err();
        assert!(matches!(err, CodegenError::UnknownTable(ref name) if name == "missing"));
    }

    #[test]
    fn test_filter_skips_unrelated_invalid_config() {
        let mut raw = raw_set();
        let mut audit = full_raw("audit", "Audit");
        audit.comment.author = None;
        raw.insert("audit".into(), audit);

        let resolved = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw, Some("user"))
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved.base("audit").is_none());
        assert_eq!(resolved.get("user").unwrap().joins().len(), 1);

        let err = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw, None)
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidConfig { ref config, .. } if config == "audit"));

        let err = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw, Some("audit"))
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidConfig { ref config, .. } if config == "audit"));
    }

    #[test]
    fn test_filter_requires_valid_join_target() {
        let mut raw = raw_set();
        raw.get_mut("address").unwrap().class.classname = None;
        let err = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw, Some("user"))
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidConfig { ref config, .. } if config == "address"));
    }

    #[test]
    fn test_invalid_model_aborts() {
        let mut raw = raw_set();
        raw.get_mut("address").unwrap().class.classname = None;
        let err = ConfigResolver::new()
            .dry_run(true)
            .resolve_all(&raw, None)
            .unwrap_err();
        assert!(matches!(
            err,
            CodegenError::InvalidConfig { ref config, ref field, .. }
                if config == "address" && field == "class.classname"
        ));
    }

    #[test]
    fn test_output_dirs_created_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = ConfigResolver::new()
            .output_root(dir.path())
            .resolve_all(&raw_set(), None)
            .unwrap();
        assert!(dir.path().join("src/entity").is_dir());
        assert!(dir.path().join("src/mapper").is_dir());

        let user = resolved.get("user").unwrap();
        assert_eq!(
            resolved.artifact_dir(user, Artifact::Entity),
            Some(dir.path().join("src/entity"))
        );
        assert_eq!(resolved.artifact_dir(user, Artifact::Repository), None);
    }

    #[test]
    fn test_output_dir_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let err = ConfigResolver::new()
            .output_root(&blocker)
            .resolve_all(&raw_set(), None)
            .unwrap_err();
        assert!(matches!(err, CodegenError::OutputDirectory { .. }));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("WARN".parse::<DanglingJoinPolicy>(), Ok(DanglingJoinPolicy::Warn));
        assert!("loud".parse::<DanglingJoinPolicy>().is_err());
    }
}
