//! Full sharding configuration snapshots
//!
//! [`ShardingRuleConfig`] is the complete sharding configuration of one
//! logical database at a point in time. Snapshots are what the runtime
//! republishes after every applied change; sub-collections are kept in
//! deterministic order so two equal configurations serialize identically.

use crate::rule::{
    AlgorithmConfig, AuditStrategy, KeyGenerateStrategy, ShardingAutoTableRule, ShardingStrategy,
    ShardingTableRule, TableReferenceRule,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete sharding configuration for one logical database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardingRuleConfig {
    /// Table rules, sorted by logical table name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<ShardingTableRule>,

    /// Auto table rules, sorted by logical table name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auto_tables: Vec<ShardingAutoTableRule>,

    /// Table reference groups, sorted by group name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table_references: Vec<TableReferenceRule>,

    /// Broadcast table names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub broadcast_tables: Vec<String>,

    /// Default database-level sharding strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_database_strategy: Option<ShardingStrategy>,

    /// Default table-level sharding strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_table_strategy: Option<ShardingStrategy>,

    /// Default key generation strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_key_generate_strategy: Option<KeyGenerateStrategy>,

    /// Default audit strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_audit_strategy: Option<AuditStrategy>,

    /// Sharding algorithms by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sharding_algorithms: BTreeMap<String, AlgorithmConfig>,

    /// Key generator algorithms by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub key_generators: BTreeMap<String, AlgorithmConfig>,

    /// Auditor algorithms by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub auditors: BTreeMap<String, AlgorithmConfig>,

    /// Column used for sharding when a table names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sharding_column: Option<String>,
}

impl ShardingRuleConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no rule of any kind is configured.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.auto_tables.is_empty()
            && self.table_references.is_empty()
            && self.broadcast_tables.is_empty()
            && self.default_database_strategy.is_none()
            && self.default_table_strategy.is_none()
            && self.default_key_generate_strategy.is_none()
            && self.default_audit_strategy.is_none()
            && self.sharding_algorithms.is_empty()
            && self.key_generators.is_empty()
            && self.auditors.is_empty()
            && self.default_sharding_column.is_none()
    }

    /// Look up a table rule by logical table name.
    pub fn table(&self, logic_table: &str) -> Option<&ShardingTableRule> {
        self.tables.iter().find(|r| r.logic_table == logic_table)
    }

    /// Look up an auto table rule by logical table name.
    pub fn auto_table(&self, logic_table: &str) -> Option<&ShardingAutoTableRule> {
        self.auto_tables
            .iter()
            .find(|r| r.logic_table == logic_table)
    }

    /// Look up a table reference group by name.
    pub fn table_reference(&self, name: &str) -> Option<&TableReferenceRule> {
        self.table_references.iter().find(|r| r.name == name)
    }
}

// ============================================================================
// Tests
// ============================================================================
