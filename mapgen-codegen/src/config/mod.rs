//! Table configuration: raw files, validated models and their resolution

pub mod defaults;
mod join;
mod model;
mod raw;
mod resolver;
mod settings;

pub use join::{DeclaredJoin, JoinDescriptor, Relation};
pub use model::{Artifact, ConfigModel, ValidationRule};
pub use raw::{
    load_raw_configs, OneOrMany, RawArtifacts, RawCache, RawClass, RawComment, RawConfigs,
    RawDatabase, RawJoin, RawRuleSpec, RawTableConfig, RawValidationRule,
};
pub use resolver::{ConfigResolver, DanglingJoinPolicy, ResolvedConfigs};
pub use settings::GeneratorSettings;
