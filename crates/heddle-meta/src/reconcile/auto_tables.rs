//! Auto table rule reconciliation

use super::{domain_mismatch, ReconcilerContext};
use crate::error::Result;
use crate::events::{ConfigDomain, RuleChangeEvent, RuleChangeOp};
use crate::hub::{ChangedSender, ReconcileOutcome, RuleChangeSubscriber};
use crate::registry::DatabaseRegistry;
use crate::version::VersionOracle;
use std::sync::Arc;

/// Applies auto table rule changes to their database's rule set.
///
/// Same merge semantics as the table domain, against the independent
/// auto table namespace.
pub struct AutoTableRuleReconciler {
    ctx: ReconcilerContext,
}

impl AutoTableRuleReconciler {
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

impl RuleChangeSubscriber for AutoTableRuleReconciler {
    fn domain(&self) -> ConfigDomain {
        ConfigDomain::AutoTables
    }

    fn on_event(&self, event: &RuleChangeEvent) -> Result<ReconcileOutcome> {
        if self.ctx.is_stale(event) {
            return Ok(ReconcileOutcome::Stale);
        }
        let database = self.ctx.database(&event.database)?;
        let lock = self.ctx.lock(&event.database);
        let _guard = lock.lock();

        let snapshot = match &event.op {
            RuleChangeOp::AddAutoTable(rule) => {
                let rules = database.sharding_or_init();
                rules.upsert_auto_table(rule.clone());
                rules.snapshot()
            }
            RuleChangeOp::AlterAutoTable { table, rule } => {
                let rules = self.ctx.require_rules(&database)?;
                rules.remove_auto_table(table);
                rules.upsert_auto_table(rule.clone());
                rules.snapshot()
            }
            RuleChangeOp::DeleteAutoTable { table } => {
                let rules = self.ctx.require_rules(&database)?;
                rules.remove_auto_table(table);
                rules.snapshot()
            }
            other => return Err(domain_mismatch(ConfigDomain::AutoTables, other)),
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
    use heddle_core::ShardingAutoTableRule;

    fn fixture() -> (EventHub, Arc<DatabaseRegistry>, AutoTableRuleReconciler) {
        let hub = EventHub::new();
        let registry = Arc::new(DatabaseRegistry::new());
        let oracle = Arc::new(MemoryVersionOracle::new());
        let reconciler =
            AutoTableRuleReconciler::new(registry.clone(), oracle, hub.changed_sender());
        (hub, registry, reconciler)
    }

    #[test]
    fn test_add_then_delete() {
        let (_hub, registry, reconciler) = fixture();
        registry.add_database("db");

        reconciler
            .on_event(&RuleChangeEvent::add_auto_table(
                "db",
                "key",
                1,
                ShardingAutoTableRule::new("t_order_item", "ds_0,ds_1"),
            ))
            .unwrap();

        let rules = registry.get("db").unwrap().sharding().unwrap();
        assert_eq!(rules.auto_table_count(), 1);

        reconciler
            .on_event(&RuleChangeEvent::delete_auto_table(
                "db",
                "key",
                2,
                "t_order_item",
            ))
            .unwrap();
        assert_eq!(rules.auto_table_count(), 0);
    }

    #[test]
    fn test_alter_without_rule_set_fails() {
        let (_hub, registry, reconciler) = fixture();
        registry.add_database("db");

        let err = reconciler
            .on_event(&RuleChangeEvent::alter_auto_table(
                "db",
                "key",
                1,
                "t_order_item",
                ShardingAutoTableRule::new("t_order_item", "ds_0"),
            ))
            .unwrap_err();
        assert!(matches!(err, MetaError::ConfigurationNotFound(_)));
    }

    #[test]
    fn test_unknown_database_fails() {
        let (_hub, _registry, reconciler) = fixture();

        let err = reconciler
            .on_event(&RuleChangeEvent::add_auto_table(
                "missing",
                "key",
                1,
                ShardingAutoTableRule::new("t_order_item", "ds_0"),
            ))
            .unwrap_err();
        assert!(matches!(err, MetaError::UnknownDatabase(_)));
    }
}
