//! Logical database registry
//!
//! Maps database names to their runtime state. The registry is handed to
//! the reconcilers at construction; nothing in this crate reaches for a
//! process-global.

use crate::error::{MetaError, Result};
use crate::ruleset::ShardingRuleSet;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

/// Runtime state for one logical database.
///
/// The sharding rule set is installed lazily: the first add-style change
/// creates it, after which the same instance lives for the life of the
/// database entry. "No rule set yet" and "rule set with no entry for a
/// key" are distinct states.
#[derive(Debug)]
pub struct LogicalDatabase {
    name: String,
    sharding: OnceLock<Arc<ShardingRuleSet>>,
}

impl LogicalDatabase {
    /// Create a database entry with no rule set installed.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sharding: OnceLock::new(),
        }
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Installed sharding rule set, if any.
    pub fn sharding(&self) -> Option<Arc<ShardingRuleSet>> {
        self.sharding.get().cloned()
    }

    /// Installed sharding rule set, creating an empty one on first use.
    pub fn sharding_or_init(&self) -> Arc<ShardingRuleSet> {
        self.sharding
            .get_or_init(|| Arc::new(ShardingRuleSet::new()))
            .clone()
    }

    /// Whether a sharding rule set has been installed.
    pub fn has_sharding(&self) -> bool {
        self.sharding.get().is_some()
    }
}

/// Registry of logical databases by name.
#[derive(Debug, Default)]
pub struct DatabaseRegistry {
    databases: DashMap<String, Arc<LogicalDatabase>>,
}

impl DatabaseRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database, keeping any existing entry.
    pub fn add_database(&self, name: &str) -> Arc<LogicalDatabase> {
        self.databases
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LogicalDatabase::new(name)))
            .clone()
    }

    /// Look up a database.
    pub fn get(&self, name: &str) -> Option<Arc<LogicalDatabase>> {
        self.databases.get(name).map(|db| db.clone())
    }

    /// Look up a database, failing if it is not registered.
    pub fn require(&self, name: &str) -> Result<Arc<LogicalDatabase>> {
        self.get(name)
            .ok_or_else(|| MetaError::UnknownDatabase(name.to_string()))
    }

    /// Remove a database entry. Returns whether one existed.
    pub fn remove(&self, name: &str) -> bool {
        self.databases.remove(name).is_some()
    }

    /// Whether a database is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.databases.contains_key(name)
    }

    /// Registered database names.
    pub fn names(&self) -> Vec<String> {
        self.databases.iter().map(|db| db.key().clone()).collect()
    }

    /// Number of registered databases.
    pub fn len(&self) -> usize {
        self.databases.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
