//! Rule node serialization
//!
//! The persistence layer stores a sharding configuration as a flat list of
//! nodes, one path + YAML value per rule item. [`rule_nodes`] flattens a
//! [`ShardingRuleConfig`] into that list in a fixed section order: tables,
//! auto tables, table references, broadcast tables, default strategies,
//! algorithm maps, default sharding column. Sections with nothing to say
//! emit no node.
//!
//! The mapping is one-way; configurations are rebuilt from change events,
//! not parsed back out of nodes.

use crate::config::ShardingRuleConfig;
use crate::error::{Error, Result};

/// Path of the broadcast tables node.
pub const BROADCAST_TABLES_PATH: &str = "broadcast_tables";

/// Path of the default database-level strategy node.
pub const DEFAULT_DATABASE_STRATEGY_PATH: &str = "default_strategies/database";

/// Path of the default table-level strategy node.
pub const DEFAULT_TABLE_STRATEGY_PATH: &str = "default_strategies/table";

/// Path of the default key generation strategy node.
pub const DEFAULT_KEY_GENERATE_STRATEGY_PATH: &str = "default_strategies/key_generate";

/// Path of the default audit strategy node.
pub const DEFAULT_AUDIT_STRATEGY_PATH: &str = "default_strategies/audit";

/// Path of the default sharding column node.
pub const DEFAULT_SHARDING_COLUMN_PATH: &str = "default_sharding_column";

/// Node path for a table rule.
pub fn table_path(logic_table: &str) -> String {
    format!("tables/{}", logic_table)
}

/// Node path for an auto table rule.
pub fn auto_table_path(logic_table: &str) -> String {
    format!("auto_tables/{}", logic_table)
}

/// Node path for a table reference group.
pub fn table_reference_path(name: &str) -> String {
    format!("table_references/{}", name)
}

/// Node path for a sharding algorithm.
pub fn algorithm_path(name: &str) -> String {
    format!("algorithms/{}", name)
}

/// Node path for a key generator algorithm.
pub fn key_generator_path(name: &str) -> String {
    format!("key_generators/{}", name)
}

/// Node path for an auditor algorithm.
pub fn auditor_path(name: &str) -> String {
    format!("auditors/{}", name)
}

/// One persisted rule item: relative path plus YAML value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    /// Path relative to the database's sharding rule root
    pub path: String,

    /// YAML-serialized value
    pub value: String,
}

impl RuleNode {
    fn new(path: impl Into<String>, value: String) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

/// Flatten a configuration into its ordered rule nodes.
///
/// Keyed rules must carry a non-empty key, otherwise their node path would
/// collide with the section root.
pub fn rule_nodes(config: &ShardingRuleConfig) -> Result<Vec<RuleNode>> {
    let mut nodes = Vec::new();

    for rule in &config.tables {
        let key = require_key(&rule.logic_table, "table rule")?;
        nodes.push(RuleNode::new(table_path(key), serde_yaml::to_string(rule)?));
    }

    for rule in &config.auto_tables {
        let key = require_key(&rule.logic_table, "auto table rule")?;
        nodes.push(RuleNode::new(
            auto_table_path(key),
            serde_yaml::to_string(rule)?,
        ));
    }

    for rule in &config.table_references {
        let key = require_key(&rule.name, "table reference group")?;
        nodes.push(RuleNode::new(
            table_reference_path(key),
            serde_yaml::to_string(rule)?,
        ));
    }

    if !config.broadcast_tables.is_empty() {
        nodes.push(RuleNode::new(
            BROADCAST_TABLES_PATH,
            serde_yaml::to_string(&config.broadcast_tables)?,
        ));
    }

    if let Some(strategy) = &config.default_database_strategy {
        nodes.push(RuleNode::new(
            DEFAULT_DATABASE_STRATEGY_PATH,
            serde_yaml::to_string(strategy)?,
        ));
    }

    if let Some(strategy) = &config.default_table_strategy {
        nodes.push(RuleNode::new(
            DEFAULT_TABLE_STRATEGY_PATH,
            serde_yaml::to_string(strategy)?,
        ));
    }

    if let Some(strategy) = &config.default_key_generate_strategy {
        nodes.push(RuleNode::new(
            DEFAULT_KEY_GENERATE_STRATEGY_PATH,
            serde_yaml::to_string(strategy)?,
        ));
    }

    if let Some(strategy) = &config.default_audit_strategy {
        nodes.push(RuleNode::new(
            DEFAULT_AUDIT_STRATEGY_PATH,
            serde_yaml::to_string(strategy)?,
        ));
    }

    for (name, algorithm) in &config.sharding_algorithms {
        let key = require_key(name, "sharding algorithm")?;
        nodes.push(RuleNode::new(
            algorithm_path(key),
            serde_yaml::to_string(algorithm)?,
        ));
    }

    for (name, generator) in &config.key_generators {
        let key = require_key(name, "key generator")?;
        nodes.push(RuleNode::new(
            key_generator_path(key),
            serde_yaml::to_string(generator)?,
        ));
    }

    for (name, auditor) in &config.auditors {
        let key = require_key(name, "auditor")?;
        nodes.push(RuleNode::new(
            auditor_path(key),
            serde_yaml::to_string(auditor)?,
        ));
    }

    if let Some(column) = &config.default_sharding_column {
        nodes.push(RuleNode::new(
            DEFAULT_SHARDING_COLUMN_PATH,
            serde_yaml::to_string(column)?,
        ));
    }

    Ok(nodes)
}

fn require_key<'a>(key: &'a str, what: &str) -> Result<&'a str> {
    if key.is_empty() {
        return Err(Error::InvalidRule(format!("{} with empty name", what)));
    }
    Ok(key)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{
        AlgorithmConfig, KeyGenerateStrategy, ShardingAutoTableRule, ShardingStrategy,
        ShardingTableRule, TableReferenceRule,
    };

    fn full_config() -> ShardingRuleConfig {
        let mut config = ShardingRuleConfig {
            tables: vec![
                ShardingTableRule::new("t_order", "ds_${0..1}.t_order_${0..1}"),
                ShardingTableRule::new("t_user", "ds_0.t_user"),
            ],
            auto_tables: vec![ShardingAutoTableRule::new("t_order_item", "ds_0,ds_1")],
            table_references: vec![TableReferenceRule::new("order_group", "t_order,t_order_item")],
            broadcast_tables: vec!["t_config".to_string()],
            default_database_strategy: Some(ShardingStrategy::Standard {
                sharding_column: "tenant_id".to_string(),
                algorithm: "tenant_mod".to_string(),
            }),
            default_key_generate_strategy: Some(KeyGenerateStrategy::new("id", "snowflake")),
            default_sharding_column: Some("tenant_id".to_string()),
            ..Default::default()
        };
        config
            .sharding_algorithms
            .insert("tenant_mod".to_string(), AlgorithmConfig::new("mod"));
        config
            .key_generators
            .insert("snowflake".to_string(), AlgorithmConfig::new("snowflake"));
        config
    }

    #[test]
    fn test_paths() {
        assert_eq!(table_path("t_order"), "tables/t_order");
        assert_eq!(auto_table_path("t_item"), "auto_tables/t_item");
        assert_eq!(table_reference_path("g"), "table_references/g");
        assert_eq!(algorithm_path("mod_2"), "algorithms/mod_2");
        assert_eq!(key_generator_path("snowflake"), "key_generators/snowflake");
        assert_eq!(auditor_path("dml_audit"), "auditors/dml_audit");
    }

    #[test]
    fn test_section_order() {
        let nodes = rule_nodes(&full_config()).unwrap();
        let paths: Vec<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "tables/t_order",
                "tables/t_user",
                "auto_tables/t_order_item",
                "table_references/order_group",
                "broadcast_tables",
                "default_strategies/database",
                "default_strategies/key_generate",
                "algorithms/tenant_mod",
                "key_generators/snowflake",
                "default_sharding_column",
            ]
        );
    }

    #[test]
    fn test_empty_config_produces_no_nodes() {
        let nodes = rule_nodes(&ShardingRuleConfig::new()).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_absent_sections_emit_no_node() {
        let config = ShardingRuleConfig {
            tables: vec![ShardingTableRule::new("t_order", "ds_0.t_order")],
            ..Default::default()
        };
        let nodes = rule_nodes(&config).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].path, "tables/t_order");
    }

    #[test]
    fn test_values_are_yaml() {
        let nodes = rule_nodes(&full_config()).unwrap();

        let table = &nodes[0];
        assert!(table.value.contains("logic_table: t_order"));
        assert!(table.value.contains("actual_data_nodes:"));

        let broadcast = nodes
            .iter()
            .find(|n| n.path == BROADCAST_TABLES_PATH)
            .unwrap();
        assert!(broadcast.value.contains("t_config"));

        let strategy = nodes
            .iter()
            .find(|n| n.path == DEFAULT_DATABASE_STRATEGY_PATH)
            .unwrap();
        assert!(strategy.value.contains("type: standard"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let config = ShardingRuleConfig {
            tables: vec![ShardingTableRule::new("", "ds_0.t")],
            ..Default::default()
        };
        assert!(matches!(
            rule_nodes(&config),
            Err(Error::InvalidRule(_))
        ));
    }
}
