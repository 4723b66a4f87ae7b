//! Live sharding rule state
//!
//! [`ShardingRuleSet`] is the mutable sharding configuration of one logical
//! database. Each sub-collection is its own concurrent container, so the
//! per-domain reconcilers can work on the same database without sharing a
//! lock: the table domains never touch each other's maps, and whole-value
//! fields swap atomically behind their own locks.
//!
//! Keyed sub-collections enforce the uniqueness invariant by construction:
//! inserting under an existing key replaces the entry, it never duplicates.
//! [`snapshot`](ShardingRuleSet::snapshot) produces the deterministic
//! [`ShardingRuleConfig`] that gets republished after every change.

use dashmap::DashMap;
use heddle_core::{
    AlgorithmConfig, AuditStrategy, KeyGenerateStrategy, ShardingAutoTableRule, ShardingRuleConfig,
    ShardingStrategy, ShardingTableRule, TableReferenceRule,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Mutable sharding configuration of one logical database.
#[derive(Debug, Default)]
pub struct ShardingRuleSet {
    tables: DashMap<String, ShardingTableRule>,
    auto_tables: DashMap<String, ShardingAutoTableRule>,
    table_references: DashMap<String, TableReferenceRule>,
    broadcast_tables: RwLock<Vec<String>>,
    default_database_strategy: RwLock<Option<ShardingStrategy>>,
    default_table_strategy: RwLock<Option<ShardingStrategy>>,
    default_key_generate_strategy: RwLock<Option<KeyGenerateStrategy>>,
    default_audit_strategy: RwLock<Option<AuditStrategy>>,
    sharding_algorithms: DashMap<String, AlgorithmConfig>,
    key_generators: DashMap<String, AlgorithmConfig>,
    auditors: DashMap<String, AlgorithmConfig>,
    default_sharding_column: RwLock<Option<String>>,
}

impl ShardingRuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Table Rules ====================

    /// Insert a table rule, replacing any entry with the same logical table.
    pub fn upsert_table(&self, rule: ShardingTableRule) {
        self.tables.insert(rule.logic_table.clone(), rule);
    }

    /// Remove a table rule. Returns whether one existed.
    pub fn remove_table(&self, logic_table: &str) -> bool {
        self.tables.remove(logic_table).is_some()
    }

    /// Look up a table rule.
    pub fn table(&self, logic_table: &str) -> Option<ShardingTableRule> {
        self.tables.get(logic_table).map(|r| r.clone())
    }

    /// Number of table rules.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    // ==================== Auto Table Rules ====================

    /// Insert an auto table rule, replacing any entry with the same logical table.
    pub fn upsert_auto_table(&self, rule: ShardingAutoTableRule) {
        self.auto_tables.insert(rule.logic_table.clone(), rule);
    }

    /// Remove an auto table rule. Returns whether one existed.
    pub fn remove_auto_table(&self, logic_table: &str) -> bool {
        self.auto_tables.remove(logic_table).is_some()
    }

    /// Look up an auto table rule.
    pub fn auto_table(&self, logic_table: &str) -> Option<ShardingAutoTableRule> {
        self.auto_tables.get(logic_table).map(|r| r.clone())
    }

    /// Number of auto table rules.
    pub fn auto_table_count(&self) -> usize {
        self.auto_tables.len()
    }

    // ==================== Table Reference Groups ====================

    /// Insert a reference group, replacing any entry with the same name.
    pub fn upsert_table_reference(&self, rule: TableReferenceRule) {
        self.table_references.insert(rule.name.clone(), rule);
    }

    /// Remove a reference group. Returns whether one existed.
    pub fn remove_table_reference(&self, name: &str) -> bool {
        self.table_references.remove(name).is_some()
    }

    /// Look up a reference group.
    pub fn table_reference(&self, name: &str) -> Option<TableReferenceRule> {
        self.table_references.get(name).map(|r| r.clone())
    }

    /// Number of reference groups.
    pub fn table_reference_count(&self) -> usize {
        self.table_references.len()
    }

    // ==================== Broadcast Tables ====================

    /// Replace the broadcast table set.
    pub fn set_broadcast_tables(&self, tables: Vec<String>) {
        *self.broadcast_tables.write() = tables;
    }

    /// Current broadcast table set.
    pub fn broadcast_tables(&self) -> Vec<String> {
        self.broadcast_tables.read().clone()
    }

    // ==================== Default Strategies ====================

    /// Set or clear the default database-level sharding strategy.
    pub fn set_default_database_strategy(&self, strategy: Option<ShardingStrategy>) {
        *self.default_database_strategy.write() = strategy;
    }

    /// Set or clear the default table-level sharding strategy.
    pub fn set_default_table_strategy(&self, strategy: Option<ShardingStrategy>) {
        *self.default_table_strategy.write() = strategy;
    }

    /// Set or clear the default key generation strategy.
    pub fn set_default_key_generate_strategy(&self, strategy: Option<KeyGenerateStrategy>) {
        *self.default_key_generate_strategy.write() = strategy;
    }

    /// Set or clear the default audit strategy.
    pub fn set_default_audit_strategy(&self, strategy: Option<AuditStrategy>) {
        *self.default_audit_strategy.write() = strategy;
    }

    /// Set or clear the default sharding column.
    pub fn set_default_sharding_column(&self, column: Option<String>) {
        *self.default_sharding_column.write() = column;
    }

    // ==================== Algorithms ====================

    /// Insert a sharding algorithm under a name.
    pub fn put_sharding_algorithm(&self, name: &str, algorithm: AlgorithmConfig) {
        self.sharding_algorithms.insert(name.to_string(), algorithm);
    }

    /// Remove a sharding algorithm. Returns whether one existed.
    pub fn remove_sharding_algorithm(&self, name: &str) -> bool {
        self.sharding_algorithms.remove(name).is_some()
    }

    /// Insert a key generator under a name.
    pub fn put_key_generator(&self, name: &str, generator: AlgorithmConfig) {
        self.key_generators.insert(name.to_string(), generator);
    }

    /// Remove a key generator. Returns whether one existed.
    pub fn remove_key_generator(&self, name: &str) -> bool {
        self.key_generators.remove(name).is_some()
    }

    /// Insert an auditor under a name.
    pub fn put_auditor(&self, name: &str, auditor: AlgorithmConfig) {
        self.auditors.insert(name.to_string(), auditor);
    }

    /// Remove an auditor. Returns whether one existed.
    pub fn remove_auditor(&self, name: &str) -> bool {
        self.auditors.remove(name).is_some()
    }

    // ==================== Snapshot ====================

    /// Whether nothing is configured.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.auto_tables.is_empty()
            && self.table_references.is_empty()
            && self.broadcast_tables.read().is_empty()
            && self.default_database_strategy.read().is_none()
            && self.default_table_strategy.read().is_none()
            && self.default_key_generate_strategy.read().is_none()
            && self.default_audit_strategy.read().is_none()
            && self.sharding_algorithms.is_empty()
            && self.key_generators.is_empty()
            && self.auditors.is_empty()
            && self.default_sharding_column.read().is_none()
    }

    /// Full configuration snapshot with deterministic ordering.
    pub fn snapshot(&self) -> ShardingRuleConfig {
        let mut tables: Vec<ShardingTableRule> =
            self.tables.iter().map(|r| r.value().clone()).collect();
        tables.sort_by(|a, b| a.logic_table.cmp(&b.logic_table));

        let mut auto_tables: Vec<ShardingAutoTableRule> =
            self.auto_tables.iter().map(|r| r.value().clone()).collect();
        auto_tables.sort_by(|a, b| a.logic_table.cmp(&b.logic_table));

        let mut table_references: Vec<TableReferenceRule> = self
            .table_references
            .iter()
            .map(|r| r.value().clone())
            .collect();
        table_references.sort_by(|a, b| a.name.cmp(&b.name));

        let sharding_algorithms: BTreeMap<String, AlgorithmConfig> = self
            .sharding_algorithms
            .iter()
            .map(|a| (a.key().clone(), a.value().clone()))
            .collect();
        let key_generators: BTreeMap<String, AlgorithmConfig> = self
            .key_generators
            .iter()
            .map(|a| (a.key().clone(), a.value().clone()))
            .collect();
        let auditors: BTreeMap<String, AlgorithmConfig> = self
            .auditors
            .iter()
            .map(|a| (a.key().clone(), a.value().clone()))
            .collect();

        ShardingRuleConfig {
            tables,
            auto_tables,
            table_references,
            broadcast_tables: self.broadcast_tables.read().clone(),
            default_database_strategy: self.default_database_strategy.read().clone(),
            default_table_strategy: self.default_table_strategy.read().clone(),
            default_key_generate_strategy: self.default_key_generate_strategy.read().clone(),
            default_audit_strategy: self.default_audit_strategy.read().clone(),
            sharding_algorithms,
            key_generators,
            auditors,
            default_sharding_column: self.default_sharding_column.read().clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
