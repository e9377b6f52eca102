//! Join declarations and resolved join descriptors

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use mapgen::JoinType;

use super::model::ConfigModel;
use super::raw::RawJoin;
use crate::error::{CodegenError, Result};

/// How many joined rows belong to one row of the owning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Relation {
    #[default]
    One,
    Many,
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "one" | "has_one" | "belongs_to" => Ok(Relation::One),
            "many" | "has_many" => Ok(Relation::Many),
            other => Err(format!("unknown relation {:?} (expected one or many)", other)),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::One => f.write_str("one"),
            Relation::Many => f.write_str("many"),
        }
    }
}

/// A validated join declaration whose target is still a config name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredJoin {
    pub alias: String,
    pub target: String,
    pub relation: Relation,
    pub join_type: JoinType,
    pub local_field: String,
    pub local_alias: String,
    pub remote_field: String,
    pub remote_alias: String,
}

impl DeclaredJoin {
    /// Validate `joins.<alias>` of config `config`. The local alias defaults
    /// to the owning table, the remote alias to the join alias.
    pub fn build(config: &str, table: &str, alias: &str, raw: &RawJoin) -> Result<Self> {
        let key = |field: &str| format!("joins.{}.{}", alias, field);
        let required = |value: &Option<String>, field: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| CodegenError::missing(config, key(field)))
        };

        let target = required(&raw.config, "config")?;
        let local_field = required(&raw.local_field, "local_field")?;
        let remote_field = required(&raw.remote_field, "remote_field")?;

        let relation = match raw.relation.as_deref() {
            Some(relation) => relation
                .parse()
                .map_err(|reason| CodegenError::invalid(config, key("relation"), reason))?,
            None => Relation::default(),
        };
        let join_type = match raw.join_type.as_deref() {
            Some(name) => JoinType::parse(name).ok_or_else(|| {
                CodegenError::invalid(
                    config,
                    key("type"),
                    format!("unknown join type {:?}", name),
                )
            })?,
            None => JoinType::default(),
        };

        Ok(Self {
            alias: alias.to_string(),
            target,
            relation,
            join_type,
            local_field,
            local_alias: non_empty(&raw.local_alias).unwrap_or_else(|| table.to_string()),
            remote_field,
            remote_alias: non_empty(&raw.remote_alias).unwrap_or_else(|| alias.to_string()),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A join wired to the base-registry model of its target table.
#[derive(Debug, Clone)]
pub struct JoinDescriptor {
    declared: DeclaredJoin,
    target: Arc<ConfigModel>,
}

impl JoinDescriptor {
    pub fn new(declared: DeclaredJoin, target: Arc<ConfigModel>) -> Self {
        Self { declared, target }
    }

    pub fn alias(&self) -> &str {
        &self.declared.alias
    }

    pub fn relation(&self) -> Relation {
        self.declared.relation
    }

    pub fn join_type(&self) -> JoinType {
        self.declared.join_type
    }

    pub fn local_field(&self) -> &str {
        &self.declared.local_field
    }

    pub fn local_alias(&self) -> &str {
        &self.declared.local_alias
    }

    pub fn remote_field(&self) -> &str {
        &self.declared.remote_field
    }

    pub fn remote_alias(&self) -> &str {
        &self.declared.remote_alias
    }

    /// The joined table's model.
    pub fn target(&self) -> &ConfigModel {
        &self.target
    }

    pub fn target_arc(&self) -> &Arc<ConfigModel> {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_join() -> RawJoin {
        RawJoin {
            config: Some("address".into()),
            local_field: Some("address_id".into()),
            remote_field: Some("id".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let join = DeclaredJoin::build("user", "user", "billing", &raw_join()).unwrap();
        assert_eq!(join.target, "address");
        assert_eq!(join.relation, Relation::One);
        assert_eq!(join.join_type, JoinType::Inner);
        assert_eq!(join.local_alias, "user");
        assert_eq!(join.remote_alias, "billing");
    }

    #[test]
    fn test_required_fields() {
        let mut raw = raw_join();
        raw.remote_field = Some("  ".into());
        let err = DeclaredJoin::build("user", "user", "billing", &raw).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::InvalidConfig { ref field, .. } if field == "joins.billing.remote_field"
        ));
    }

    #[test]
    fn test_relation_and_type() {
        let mut raw = raw_join();
        raw.relation = Some("many".into());
        raw.join_type = Some("LEFT OUTER".into());
        let join = DeclaredJoin::build("user", "user", "orders", &raw).unwrap();
        assert_eq!(join.relation, Relation::Many);
        assert_eq!(join.join_type, JoinType::LeftOuter);

        raw.join_type = Some("sideways".into());
        let err = DeclaredJoin::build("user", "user", "orders", &raw).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::InvalidConfig { ref field, .. } if field == "joins.orders.type"
        ));
    }
}
