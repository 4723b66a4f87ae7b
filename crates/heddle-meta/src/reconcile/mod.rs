//! # Rule Change Reconciliation
//!
//! One reconciler per configuration domain, all built on the same pipeline:
//!
//! ```text
//!  RuleChangeEvent
//!        │
//!        ▼
//!  ┌───────────┐ stale  ┌────────────────────────┐
//!  │  version  │───────▶│ discard, emit nothing  │
//!  │   gate    │        └────────────────────────┘
//!  └─────┬─────┘
//!        ▼
//!  ┌───────────┐  ┌───────────┐  ┌───────────────┐  ┌───────────┐
//!  │  resolve  │─▶│ lock this │─▶│ merge into    │─▶│ republish │
//!  │ database  │  │ database  │  │ rule set      │  │ full cfg  │
//!  └───────────┘  └───────────┘  └───────────────┘  └───────────┘
//! ```
//!
//! Each reconciler owns its own lock map keyed by database name: changes
//! for the same database serialize within a domain while different
//! databases, and different domains, proceed in parallel. Cross-domain
//! safety comes from the rule set's per-sub-collection containers.
//!
//! Reference group changes skip the version gate; all other domains are
//! gated. Broadcast changes never merge anything here: the broadcast set
//! is maintained directly on the rule set, and the reconciler's job is the
//! republish.

mod auto_tables;
mod broadcast;
mod references;
mod tables;

pub use auto_tables::AutoTableRuleReconciler;
pub use broadcast::BroadcastTableReconciler;
pub use references::TableReferenceReconciler;
pub use tables::TableRuleReconciler;

use crate::error::{MetaError, Result};
use crate::events::{ConfigDomain, RuleChangeEvent, RuleChangeOp};
use crate::hub::{ChangedSender, EventHub};
use crate::registry::{DatabaseRegistry, LogicalDatabase};
use crate::ruleset::ShardingRuleSet;
use crate::version::VersionOracle;
use dashmap::DashMap;
use heddle_core::ShardingRuleConfig;
use parking_lot::Mutex;
use std::sync::Arc;

/// Register one reconciler per domain on a hub.
pub fn install(hub: &EventHub, registry: Arc<DatabaseRegistry>, oracle: Arc<dyn VersionOracle>) {
    let changed = hub.changed_sender();
    hub.register(Arc::new(TableRuleReconciler::new(
        registry.clone(),
        oracle.clone(),
        changed.clone(),
    )));
    hub.register(Arc::new(AutoTableRuleReconciler::new(
        registry.clone(),
        oracle.clone(),
        changed.clone(),
    )));
    hub.register(Arc::new(TableReferenceReconciler::new(
        registry.clone(),
        oracle.clone(),
        changed.clone(),
    )));
    hub.register(Arc::new(BroadcastTableReconciler::new(
        registry, oracle, changed,
    )));
}

/// Per-database mutexes, created on demand.
#[derive(Debug, Default)]
struct DatabaseLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DatabaseLocks {
    fn acquire(&self, database: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(database.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Shared pipeline state of one reconciler instance.
pub(crate) struct ReconcilerContext {
    registry: Arc<DatabaseRegistry>,
    oracle: Arc<dyn VersionOracle>,
    changed: ChangedSender,
    locks: DatabaseLocks,
}

impl ReconcilerContext {
    pub(crate) fn new(
        registry: Arc<DatabaseRegistry>,
        oracle: Arc<dyn VersionOracle>,
        changed: ChangedSender,
    ) -> Self {
        Self {
            registry,
            oracle,
            changed,
            locks: DatabaseLocks::default(),
        }
    }

    /// Whether the event's version is below the active one for its key.
    pub(crate) fn is_stale(&self, event: &RuleChangeEvent) -> bool {
        if event.op.bypasses_version_gate() {
            return false;
        }
        event.version < self.oracle.active_version(&event.version_key)
    }

    /// Resolve the event's database.
    pub(crate) fn database(&self, name: &str) -> Result<Arc<LogicalDatabase>> {
        self.registry.require(name)
    }

    /// Installed rule set of a database, or `ConfigurationNotFound`.
    pub(crate) fn require_rules(&self, database: &LogicalDatabase) -> Result<Arc<ShardingRuleSet>> {
        database
            .sharding()
            .ok_or_else(|| MetaError::ConfigurationNotFound(database.name().to_string()))
    }

    /// Mutex for a database, created on first use.
    pub(crate) fn lock(&self, database: &str) -> Arc<Mutex<()>> {
        self.locks.acquire(database)
    }

    /// Republish a database's full configuration.
    pub(crate) fn publish(&self, database: &str, config: ShardingRuleConfig) {
        self.changed.publish(database, config);
    }
}

/// Error for an operation routed to the wrong domain's reconciler.
pub(crate) fn domain_mismatch(domain: ConfigDomain, op: &RuleChangeOp) -> MetaError {
    MetaError::DomainMismatch {
        domain: domain.to_string(),
        kind: op.kind().to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
