//! Rule change events
//!
//! Twelve change notifications, one per (operation, domain) pair, carried
//! in a common [`RuleChangeEvent`] envelope. Add and alter events for the
//! table-keyed domains carry the new rule payload; delete events carry the
//! key only. Broadcast events are republish triggers: their payload is not
//! consumed by the reconcilers because the broadcast set is maintained
//! directly on the rule set by its collaborator.

use heddle_core::{
    ShardingAutoTableRule, ShardingRuleConfig, ShardingTableRule, TableReferenceRule,
};
use serde::{Deserialize, Serialize};

/// Configuration domain a change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigDomain {
    /// Table rules
    Tables,
    /// Auto table rules
    AutoTables,
    /// Table reference groups
    TableReferences,
    /// Broadcast tables
    Broadcast,
}

impl std::fmt::Display for ConfigDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigDomain::Tables => write!(f, "tables"),
            ConfigDomain::AutoTables => write!(f, "auto_tables"),
            ConfigDomain::TableReferences => write!(f, "table_references"),
            ConfigDomain::Broadcast => write!(f, "broadcast"),
        }
    }
}

/// A single sharding rule change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleChangeOp {
    /// Upsert a table rule keyed by the payload's logical table
    AddTable(ShardingTableRule),
    /// Replace the table rule named by `table` with the payload
    AlterTable {
        table: String,
        rule: ShardingTableRule,
    },
    /// Remove the table rule named by `table`
    DeleteTable { table: String },

    /// Upsert an auto table rule keyed by the payload's logical table
    AddAutoTable(ShardingAutoTableRule),
    /// Replace the auto table rule named by `table` with the payload
    AlterAutoTable {
        table: String,
        rule: ShardingAutoTableRule,
    },
    /// Remove the auto table rule named by `table`
    DeleteAutoTable { table: String },

    /// Upsert a reference group keyed by the payload's name
    AddTableReference(TableReferenceRule),
    /// Replace the reference group named by `name` with the payload
    AlterTableReference {
        name: String,
        rule: TableReferenceRule,
    },
    /// Remove the reference group named by `name`
    DeleteTableReference { name: String },

    /// Broadcast set was created; republish the configuration
    AddBroadcast(Vec<String>),
    /// Broadcast set was replaced; republish the configuration
    AlterBroadcast(Vec<String>),
    /// Broadcast set was dropped; republish the configuration
    DeleteBroadcast,
}

impl RuleChangeOp {
    /// Domain this operation belongs to.
    pub fn domain(&self) -> ConfigDomain {
        match self {
            RuleChangeOp::AddTable(_)
            | RuleChangeOp::AlterTable { .. }
            | RuleChangeOp::DeleteTable { .. } => ConfigDomain::Tables,
            RuleChangeOp::AddAutoTable(_)
            | RuleChangeOp::AlterAutoTable { .. }
            | RuleChangeOp::DeleteAutoTable { .. } => ConfigDomain::AutoTables,
            RuleChangeOp::AddTableReference(_)
            | RuleChangeOp::AlterTableReference { .. }
            | RuleChangeOp::DeleteTableReference { .. } => ConfigDomain::TableReferences,
            RuleChangeOp::AddBroadcast(_)
            | RuleChangeOp::AlterBroadcast(_)
            | RuleChangeOp::DeleteBroadcast => ConfigDomain::Broadcast,
        }
    }

    /// Operation kind as a stable lowercase name for logs and stats.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleChangeOp::AddTable(_) => "add_table",
            RuleChangeOp::AlterTable { .. } => "alter_table",
            RuleChangeOp::DeleteTable { .. } => "delete_table",
            RuleChangeOp::AddAutoTable(_) => "add_auto_table",
            RuleChangeOp::AlterAutoTable { .. } => "alter_auto_table",
            RuleChangeOp::DeleteAutoTable { .. } => "delete_auto_table",
            RuleChangeOp::AddTableReference(_) => "add_table_reference",
            RuleChangeOp::AlterTableReference { .. } => "alter_table_reference",
            RuleChangeOp::DeleteTableReference { .. } => "delete_table_reference",
            RuleChangeOp::AddBroadcast(_) => "add_broadcast_tables",
            RuleChangeOp::AlterBroadcast(_) => "alter_broadcast_tables",
            RuleChangeOp::DeleteBroadcast => "delete_broadcast_tables",
        }
    }

    /// Whether this operation skips the stale-version check.
    ///
    /// Reference group changes are applied regardless of version; every
    /// other domain is gated.
    pub fn bypasses_version_gate(&self) -> bool {
        self.domain() == ConfigDomain::TableReferences
    }
}

/// Envelope for one rule change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleChangeEvent {
    /// Logical database the change belongs to
    pub database: String,
    /// Version key the change was written under
    pub version_key: String,
    /// Version of the change
    pub version: u64,
    /// The change itself
    pub op: RuleChangeOp,
}

impl RuleChangeEvent {
    /// Create an event envelope.
    pub fn new(database: &str, version_key: &str, version: u64, op: RuleChangeOp) -> Self {
        Self {
            database: database.to_string(),
            version_key: version_key.to_string(),
            version,
            op,
        }
    }

    /// Add-table event.
    pub fn add_table(
        database: &str,
        version_key: &str,
        version: u64,
        rule: ShardingTableRule,
    ) -> Self {
        Self::new(database, version_key, version, RuleChangeOp::AddTable(rule))
    }

    /// Alter-table event for the table named by `table`.
    pub fn alter_table(
        database: &str,
        version_key: &str,
        version: u64,
        table: &str,
        rule: ShardingTableRule,
    ) -> Self {
        Self::new(
            database,
            version_key,
            version,
            RuleChangeOp::AlterTable {
                table: table.to_string(),
                rule,
            },
        )
    }

    /// Delete-table event.
    pub fn delete_table(database: &str, version_key: &str, version: u64, table: &str) -> Self {
        Self::new(
            database,
            version_key,
            version,
            RuleChangeOp::DeleteTable {
                table: table.to_string(),
            },
        )
    }

    /// Add-auto-table event.
    pub fn add_auto_table(
        database: &str,
        version_key: &str,
        version: u64,
        rule: ShardingAutoTableRule,
    ) -> Self {
        Self::new(
            database,
            version_key,
            version,
            RuleChangeOp::AddAutoTable(rule),
        )
    }

    /// Alter-auto-table event for the table named by `table`.
    pub fn alter_auto_table(
        database: &str,
        version_key: &str,
        version: u64,
        table: &str,
        rule: ShardingAutoTableRule,
    ) -> Self {
        Self::new(
            database,
            version_key,
            version,
            RuleChangeOp::AlterAutoTable {
                table: table.to_string(),
                rule,
            },
        )
    }

    /// Delete-auto-table event.
    pub fn delete_auto_table(database: &str, version_key: &str, version: u64, table: &str) -> Self {
        Self::new(
            database,
            version_key,
            version,
            RuleChangeOp::DeleteAutoTable {
                table: table.to_string(),
            },
        )
    }

    /// Add-table-reference event.
    pub fn add_table_reference(
        database: &str,
        version_key: &str,
        version: u64,
        rule: TableReferenceRule,
    ) -> Self {
        Self::new(
            database,
            version_key,
            version,
            RuleChangeOp::AddTableReference(rule),
        )
    }

    /// Alter-table-reference event for the group named by `name`.
    pub fn alter_table_reference(
        database: &str,
        version_key: &str,
        version: u64,
        name: &str,
        rule: TableReferenceRule,
    ) -> Self {
        Self::new(
            database,
            version_key,
            version,
            RuleChangeOp::AlterTableReference {
                name: name.to_string(),
                rule,
            },
        )
    }

    /// Delete-table-reference event.
    pub fn delete_table_reference(
        database: &str,
        version_key: &str,
        version: u64,
        name: &str,
    ) -> Self {
        Self::new(
            database,
            version_key,
            version,
            RuleChangeOp::DeleteTableReference {
                name: name.to_string(),
            },
        )
    }

    /// Add-broadcast event.
    pub fn add_broadcast(
        database: &str,
        version_key: &str,
        version: u64,
        tables: Vec<String>,
    ) -> Self {
        Self::new(
            database,
            version_key,
            version,
            RuleChangeOp::AddBroadcast(tables),
        )
    }

    /// Alter-broadcast event.
    pub fn alter_broadcast(
        database: &str,
        version_key: &str,
        version: u64,
        tables: Vec<String>,
    ) -> Self {
        Self::new(
            database,
            version_key,
            version,
            RuleChangeOp::AlterBroadcast(tables),
        )
    }

    /// Delete-broadcast event.
    pub fn delete_broadcast(database: &str, version_key: &str, version: u64) -> Self {
        Self::new(database, version_key, version, RuleChangeOp::DeleteBroadcast)
    }
}

/// Full configuration republished after a change was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfigurationChanged {
    /// Logical database the configuration belongs to
    pub database: String,
    /// Complete current configuration
    pub config: ShardingRuleConfig,
}

// ============================================================================
// Tests
// ============================================================================
