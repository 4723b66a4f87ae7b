//! Table rule reconciliation

use super::{domain_mismatch, ReconcilerContext};
use crate::error::Result;
use crate::events::{ConfigDomain, RuleChangeEvent, RuleChangeOp};
use crate::hub::{ChangedSender, ReconcileOutcome, RuleChangeSubscriber};
use crate::registry::DatabaseRegistry;
use crate::version::VersionOracle;
use std::sync::Arc;

/// Applies table rule changes to their database's rule set.
///
/// Add upserts by the payload's logical table and installs the rule set if
/// the database has none yet. Alter removes the entry named by the event
/// before inserting the payload, so a payload carrying a new logical table
/// name renames the entry. Delete removes by the event's name and is a
/// no-op for absent keys, but still requires an installed rule set.
pub struct TableRuleReconciler {
    ctx: ReconcilerContext,
}

impl TableRuleReconciler {
    /// Create a reconciler over the given registry and oracle.
    pub fn new(
        registry: Arc<DatabaseRegistry>,
        oracle: Arc<dyn VersionOracle>,
        changed: ChangedSender,
    ) -> Self {
        Self {
            ctx: ReconcilerContext::new(registry, oracle, changed),
        }
    }
}

impl RuleChangeSubscriber for TableRuleReconciler {
    fn domain(&self) -> ConfigDomain {
        ConfigDomain::Tables
    }

    fn on_event(&self, event: &RuleChangeEvent) -> Result<ReconcileOutcome> {
        if self.ctx.is_stale(event) {
            return Ok(ReconcileOutcome::Stale);
        }
        let database = self.ctx.database(&event.database)?;
        let lock = self.ctx.lock(&event.database);
        let _guard = lock.lock();

        let snapshot = match &event.op {
            RuleChangeOp::AddTable(rule) => {
                let rules = database.sharding_or_init();
                rules.upsert_table(rule.clone());
                rules.snapshot()
            }
            RuleChangeOp::AlterTable { table, rule } => {
                let rules = self.ctx.require_rules(&database)?;
                rules.remove_table(table);
                rules.upsert_table(rule.clone());
                rules.snapshot()
            }
            RuleChangeOp::DeleteTable { table } => {
                let rules = self.ctx.require_rules(&database)?;
                rules.remove_table(table);
                rules.snapshot()
            }
            other => return Err(domain_mismatch(ConfigDomain::Tables, other)),
        };

        self.ctx.publish(&event.database, snapshot);
        Ok(ReconcileOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetaError;
    use crate::hub::EventHub;
    use crate::version::MemoryVersionOracle;
    use heddle_core::ShardingTableRule;

    fn fixture() -> (EventHub, Arc<DatabaseRegistry>, TableRuleReconciler) {
        let hub = EventHub::new();
        let registry = Arc::new(DatabaseRegistry::new());
        let oracle = Arc::new(MemoryVersionOracle::new());
        let reconciler =
            TableRuleReconciler::new(registry.clone(), oracle, hub.changed_sender());
        (hub, registry, reconciler)
    }

    #[test]
    fn test_add_installs_rule_set() {
        let (_hub, registry, reconciler) = fixture();
        registry.add_database("db");

        let event = RuleChangeEvent::add_table(
            "db",
            "key",
            1,
            ShardingTableRule::new("t_order", "ds_0.t_order"),
        );
        assert_eq!(
            reconciler.on_event(&event).unwrap(),
            ReconcileOutcome::Applied
        );

        let database = registry.get("db").unwrap();
        assert!(database.has_sharding());
        assert!(database.sharding().unwrap().table("t_order").is_some());
    }

    #[test]
    fn test_alter_renames_entry() {
        let (_hub, registry, reconciler) = fixture();
        registry.add_database("db");

        reconciler
            .on_event(&RuleChangeEvent::add_table(
                "db",
                "key",
                1,
                ShardingTableRule::new("t_order", "ds_0.t_order"),
            ))
            .unwrap();
        reconciler
            .on_event(&RuleChangeEvent::alter_table(
                "db",
                "key",
                2,
                "t_order",
                ShardingTableRule::new("t_order_v2", "ds_${0..1}.t_order_v2"),
            ))
            .unwrap();

        let rules = registry.get("db").unwrap().sharding().unwrap();
        assert!(rules.table("t_order").is_none());
        assert!(rules.table("t_order_v2").is_some());
        assert_eq!(rules.table_count(), 1);
    }

    #[test]
    fn test_alter_without_rule_set_fails() {
        let (hub, registry, reconciler) = fixture();
        registry.add_database("db");
        let mut rx = hub.subscribe_changes();

        let err = reconciler
            .on_event(&RuleChangeEvent::alter_table(
                "db",
                "key",
                1,
                "t_order",
                ShardingTableRule::new("t_order", "ds_0.t_order"),
            ))
            .unwrap_err();

        assert!(matches!(err, MetaError::ConfigurationNotFound(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_delete_missing_key_republishes() {
        let (hub, registry, reconciler) = fixture();
        registry.add_database("db");
        let mut rx = hub.subscribe_changes();

        reconciler
            .on_event(&RuleChangeEvent::add_table(
                "db",
                "key",
                1,
                ShardingTableRule::new("t_order", "ds_0.t_order"),
            ))
            .unwrap();
        rx.try_recv().unwrap();

        let outcome = reconciler
            .on_event(&RuleChangeEvent::delete_table("db", "key", 2, "t_missing"))
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Applied);

        let changed = rx.try_recv().unwrap();
        assert_eq!(changed.config.tables.len(), 1);
    }

    #[test]
    fn test_foreign_operation_rejected() {
        let (_hub, registry, reconciler) = fixture();
        registry.add_database("db");

        let event = RuleChangeEvent::add_broadcast("db", "key", 1, vec!["t_config".into()]);
        let err = reconciler.on_event(&event).unwrap_err();
        assert!(matches!(err, MetaError::DomainMismatch { .. }));
    }
}
