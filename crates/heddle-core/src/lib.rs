pub mod config;
pub mod error;
pub mod node;
pub mod rule;

pub use config::ShardingRuleConfig;
pub use error::{Error, Result};
pub use node::{rule_nodes, RuleNode};
pub use rule::{
    AlgorithmConfig, AuditStrategy, KeyGenerateStrategy, ShardingAutoTableRule, ShardingStrategy,
    ShardingTableRule, TableReferenceRule,
};
