//! Sharding rule types
//!
//! The building blocks of a sharding configuration:
//!
//! - [`ShardingTableRule`]: a logical table with explicit data nodes
//! - [`ShardingAutoTableRule`]: a logical table sharded automatically over data sources
//! - [`TableReferenceRule`]: a group of logical tables routed together
//! - [`ShardingStrategy`] / [`KeyGenerateStrategy`] / [`AuditStrategy`]: how rows are
//!   placed, keyed and audited
//! - [`AlgorithmConfig`]: a named algorithm descriptor with properties

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sharding rule for one logical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardingTableRule {
    /// Logical table name (unique within a database)
    pub logic_table: String,

    /// Data node expression, e.g. `ds_${0..1}.t_order_${0..1}`
    pub actual_data_nodes: String,

    /// Database-level sharding strategy override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_strategy: Option<ShardingStrategy>,

    /// Table-level sharding strategy override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_strategy: Option<ShardingStrategy>,

    /// Key generation strategy override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_generate_strategy: Option<KeyGenerateStrategy>,

    /// Audit strategy override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_strategy: Option<AuditStrategy>,
}

impl ShardingTableRule {
    /// Create a table rule with no strategy overrides.
    pub fn new(logic_table: &str, actual_data_nodes: &str) -> Self {
        Self {
            logic_table: logic_table.to_string(),
            actual_data_nodes: actual_data_nodes.to_string(),
            database_strategy: None,
            table_strategy: None,
            key_generate_strategy: None,
            audit_strategy: None,
        }
    }

    /// Set the database-level sharding strategy.
    pub fn with_database_strategy(mut self, strategy: ShardingStrategy) -> Self {
        self.database_strategy = Some(strategy);
        self
    }

    /// Set the table-level sharding strategy.
    pub fn with_table_strategy(mut self, strategy: ShardingStrategy) -> Self {
        self.table_strategy = Some(strategy);
        self
    }

    /// Set the key generation strategy.
    pub fn with_key_generate_strategy(mut self, strategy: KeyGenerateStrategy) -> Self {
        self.key_generate_strategy = Some(strategy);
        self
    }

    /// Set the audit strategy.
    pub fn with_audit_strategy(mut self, strategy: AuditStrategy) -> Self {
        self.audit_strategy = Some(strategy);
        self
    }
}

/// Sharding rule for an auto-sharded logical table.
///
/// Auto tables list data sources instead of explicit data nodes; the
/// sharding strategy derives the node layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardingAutoTableRule {
    /// Logical table name (unique within a database)
    pub logic_table: String,

    /// Comma-joined data source names, e.g. `ds_0,ds_1`
    pub actual_data_sources: String,

    /// Sharding strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharding_strategy: Option<ShardingStrategy>,

    /// Key generation strategy override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_generate_strategy: Option<KeyGenerateStrategy>,

    /// Audit strategy override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_strategy: Option<AuditStrategy>,
}

impl ShardingAutoTableRule {
    /// Create an auto table rule with no strategies.
    pub fn new(logic_table: &str, actual_data_sources: &str) -> Self {
        Self {
            logic_table: logic_table.to_string(),
            actual_data_sources: actual_data_sources.to_string(),
            sharding_strategy: None,
            key_generate_strategy: None,
            audit_strategy: None,
        }
    }

    /// Set the sharding strategy.
    pub fn with_sharding_strategy(mut self, strategy: ShardingStrategy) -> Self {
        self.sharding_strategy = Some(strategy);
        self
    }

    /// Set the key generation strategy.
    pub fn with_key_generate_strategy(mut self, strategy: KeyGenerateStrategy) -> Self {
        self.key_generate_strategy = Some(strategy);
        self
    }

    /// Set the audit strategy.
    pub fn with_audit_strategy(mut self, strategy: AuditStrategy) -> Self {
        self.audit_strategy = Some(strategy);
        self
    }
}

/// A named group of logical tables that share sharding keys and are
/// routed together, avoiding cross-node joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReferenceRule {
    /// Group name (unique within a database)
    pub name: String,

    /// Comma-joined logical table names, e.g. `t_order,t_order_item`
    pub reference: String,
}

impl TableReferenceRule {
    /// Create a table reference group.
    pub fn new(name: &str, reference: &str) -> Self {
        Self {
            name: name.to_string(),
            reference: reference.to_string(),
        }
    }

    /// Logical tables in this group.
    pub fn tables(&self) -> Vec<String> {
        self.reference
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// How rows of a table are assigned to data nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShardingStrategy {
    /// Single-column strategy backed by a named algorithm
    Standard {
        sharding_column: String,
        algorithm: String,
    },
    /// Multi-column strategy, columns comma-joined
    Complex {
        sharding_columns: String,
        algorithm: String,
    },
    /// Strategy driven by hints carried on the session
    Hint { algorithm: String },
    /// No sharding at this level
    None,
}

impl ShardingStrategy {
    /// Strategy kind as a lowercase name.
    pub fn kind(&self) -> &'static str {
        match self {
            ShardingStrategy::Standard { .. } => "standard",
            ShardingStrategy::Complex { .. } => "complex",
            ShardingStrategy::Hint { .. } => "hint",
            ShardingStrategy::None => "none",
        }
    }

    /// Referenced algorithm name, if the strategy uses one.
    pub fn algorithm(&self) -> Option<&str> {
        match self {
            ShardingStrategy::Standard { algorithm, .. }
            | ShardingStrategy::Complex { algorithm, .. }
            | ShardingStrategy::Hint { algorithm } => Some(algorithm),
            ShardingStrategy::None => None,
        }
    }
}

impl std::fmt::Display for ShardingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// How generated keys are produced for inserts missing the key column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyGenerateStrategy {
    /// Column populated with generated keys
    pub column: String,

    /// Named key generator algorithm
    pub key_generator: String,
}

impl KeyGenerateStrategy {
    /// Create a key generation strategy.
    pub fn new(column: &str, key_generator: &str) -> Self {
        Self {
            column: column.to_string(),
            key_generator: key_generator.to_string(),
        }
    }
}

/// Which auditors run against sharded DML and whether hints may disable them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStrategy {
    /// Named auditor algorithms, in evaluation order
    pub auditors: Vec<String>,

    /// Whether a session hint may skip auditing
    pub allow_hint_disable: bool,
}

impl AuditStrategy {
    /// Create an audit strategy.
    pub fn new(auditors: Vec<String>, allow_hint_disable: bool) -> Self {
        Self {
            auditors,
            allow_hint_disable,
        }
    }
}

/// A named algorithm descriptor: type plus string properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    /// Algorithm type, e.g. `hash_mod`, `inline`, `snowflake`
    pub algorithm_type: String,

    /// Algorithm properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, String>,
}

impl AlgorithmConfig {
    /// Create an algorithm descriptor with no properties.
    pub fn new(algorithm_type: &str) -> Self {
        Self {
            algorithm_type: algorithm_type.to_string(),
            props: BTreeMap::new(),
        }
    }

    /// Add a property.
    pub fn with_prop(mut self, key: &str, value: &str) -> Self {
        self.props.insert(key.to_string(), value.to_string());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rule_new() {
        let rule = ShardingTableRule::new("t_order", "ds_${0..1}.t_order_${0..1}");
        assert_eq!(rule.logic_table, "t_order");
        assert_eq!(rule.actual_data_nodes, "ds_${0..1}.t_order_${0..1}");
        assert!(rule.database_strategy.is_none());
        assert!(rule.table_strategy.is_none());
    }

    #[test]
    fn test_table_rule_builders() {
        let rule = ShardingTableRule::new("t_order", "ds_0.t_order")
            .with_table_strategy(ShardingStrategy::Standard {
                sharding_column: "order_id".to_string(),
                algorithm: "t_order_inline".to_string(),
            })
            .with_key_generate_strategy(KeyGenerateStrategy::new("order_id", "snowflake"));

        assert_eq!(rule.table_strategy.as_ref().unwrap().kind(), "standard");
        assert_eq!(
            rule.key_generate_strategy.as_ref().unwrap().key_generator,
            "snowflake"
        );
    }

    #[test]
    fn test_auto_table_rule_new() {
        let rule = ShardingAutoTableRule::new("t_order_item", "ds_0,ds_1").with_sharding_strategy(
            ShardingStrategy::Standard {
                sharding_column: "order_id".to_string(),
                algorithm: "hash_mod_4".to_string(),
            },
        );
        assert_eq!(rule.actual_data_sources, "ds_0,ds_1");
        assert_eq!(
            rule.sharding_strategy.as_ref().unwrap().algorithm(),
            Some("hash_mod_4")
        );
    }

    #[test]
    fn test_reference_rule_tables() {
        let rule = TableReferenceRule::new("order_group", "t_order, t_order_item,t_order_detail");
        assert_eq!(
            rule.tables(),
            vec!["t_order", "t_order_item", "t_order_detail"]
        );
    }

    #[test]
    fn test_reference_rule_tables_skips_empty() {
        let rule = TableReferenceRule::new("g", "t_order,,t_order_item,");
        assert_eq!(rule.tables(), vec!["t_order", "t_order_item"]);
    }

    #[test]
    fn test_strategy_kind_and_algorithm() {
        let standard = ShardingStrategy::Standard {
            sharding_column: "user_id".to_string(),
            algorithm: "mod_2".to_string(),
        };
        assert_eq!(standard.kind(), "standard");
        assert_eq!(standard.algorithm(), Some("mod_2"));

        let hint = ShardingStrategy::Hint {
            algorithm: "by_hint".to_string(),
        };
        assert_eq!(hint.kind(), "hint");

        assert_eq!(ShardingStrategy::None.kind(), "none");
        assert_eq!(ShardingStrategy::None.algorithm(), None);
    }

    #[test]
    fn test_strategy_yaml_tag() {
        let strategy = ShardingStrategy::Standard {
            sharding_column: "order_id".to_string(),
            algorithm: "t_order_inline".to_string(),
        };
        let yaml = serde_yaml::to_string(&strategy).unwrap();
        assert!(yaml.contains("type: standard"));
        assert!(yaml.contains("sharding_column: order_id"));

        let parsed: ShardingStrategy = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, strategy);
    }

    #[test]
    fn test_none_strategy_yaml() {
        let yaml = serde_yaml::to_string(&ShardingStrategy::None).unwrap();
        assert!(yaml.contains("type: none"));
    }

    #[test]
    fn test_algorithm_props() {
        let algorithm = AlgorithmConfig::new("inline")
            .with_prop("algorithm-expression", "t_order_${order_id % 2}")
            .with_prop("allow-range-query-with-inline-sharding", "false");
        assert_eq!(algorithm.algorithm_type, "inline");
        assert_eq!(algorithm.props.len(), 2);
        assert_eq!(
            algorithm.props.get("algorithm-expression").unwrap(),
            "t_order_${order_id % 2}"
        );
    }

    #[test]
    fn test_table_rule_yaml_skips_absent_strategies() {
        let rule = ShardingTableRule::new("t_order", "ds_0.t_order");
        let yaml = serde_yaml::to_string(&rule).unwrap();
        assert!(yaml.contains("logic_table: t_order"));
        assert!(!yaml.contains("database_strategy"));
        assert!(!yaml.contains("audit_strategy"));
    }
}
