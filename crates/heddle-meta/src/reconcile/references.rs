//! Table reference group reconciliation

use super::{domain_mismatch, ReconcilerContext};
use crate::error::Result;
use crate::events::{ConfigDomain, RuleChangeEvent, RuleChangeOp};
use crate::hub::{ChangedSender, ReconcileOutcome, RuleChangeSubscriber};
use crate::registry::DatabaseRegistry;
use crate::version::VersionOracle;
use std::sync::Arc;

/// Applies reference group changes to their database's rule set.
///
/// Reference group events carry no version gate: the routing constraint
/// they express must hold against whatever table rules are current, so
/// they apply unconditionally in delivery order.
pub struct TableReferenceReconciler {
    ctx: ReconcilerContext,
}

impl TableReferenceReconciler {
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

impl RuleChangeSubscriber for TableReferenceReconciler {
    fn domain(&self) -> ConfigDomain {
        ConfigDomain::TableReferences
    }

    fn on_event(&self, event: &RuleChangeEvent) -> Result<ReconcileOutcome> {
        if self.ctx.is_stale(event) {
            return Ok(ReconcileOutcome::Stale);
        }
        let database = self.ctx.database(&event.database)?;
        let lock = self.ctx.lock(&event.database);
        let _guard = lock.lock();

        let snapshot = match &event.op {
            RuleChangeOp::AddTableReference(rule) => {
                let rules = database.sharding_or_init();
                rules.upsert_table_reference(rule.clone());
                rules.snapshot()
            }
            RuleChangeOp::AlterTableReference { name, rule } => {
                let rules = self.ctx.require_rules(&database)?;
                rules.remove_table_reference(name);
                rules.upsert_table_reference(rule.clone());
                rules.snapshot()
            }
            RuleChangeOp::DeleteTableReference { name } => {
                let rules = self.ctx.require_rules(&database)?;
                rules.remove_table_reference(name);
                rules.snapshot()
            }
            other => return Err(domain_mismatch(ConfigDomain::TableReferences, other)),
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
    use heddle_core::TableReferenceRule;

    fn fixture() -> (
        EventHub,
        Arc<DatabaseRegistry>,
        Arc<MemoryVersionOracle>,
        TableReferenceReconciler,
    ) {
        let hub = EventHub::new();
        let registry = Arc::new(DatabaseRegistry::new());
        let oracle = Arc::new(MemoryVersionOracle::new());
        let reconciler =
            TableReferenceReconciler::new(registry.clone(), oracle.clone(), hub.changed_sender());
        (hub, registry, oracle, reconciler)
    }

    #[test]
    fn test_applies_below_active_version() {
        let (_hub, registry, oracle, reconciler) = fixture();
        registry.add_database("db");
        oracle.set_active("key", 9);

        let outcome = reconciler
            .on_event(&RuleChangeEvent::add_table_reference(
                "db",
                "key",
                0,
                TableReferenceRule::new("order_group", "t_order,t_order_item"),
            ))
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Applied);
        let rules = registry.get("db").unwrap().sharding().unwrap();
        assert!(rules.table_reference("order_group").is_some());
    }

    #[test]
    fn test_alter_renames_group() {
        let (_hub, registry, _oracle, reconciler) = fixture();
        registry.add_database("db");

        reconciler
            .on_event(&RuleChangeEvent::add_table_reference(
                "db",
                "key",
                1,
                TableReferenceRule::new("order_group", "t_order,t_order_item"),
            ))
            .unwrap();
        reconciler
            .on_event(&RuleChangeEvent::alter_table_reference(
                "db",
                "key",
                2,
                "order_group",
                TableReferenceRule::new("order_refs", "t_order,t_order_item,t_order_detail"),
            ))
            .unwrap();

        let rules = registry.get("db").unwrap().sharding().unwrap();
        assert!(rules.table_reference("order_group").is_none());
        assert_eq!(
            rules.table_reference("order_refs").unwrap().tables().len(),
            3
        );
    }

    #[test]
    fn test_delete_without_rule_set_fails() {
        let (_hub, registry, _oracle, reconciler) = fixture();
        registry.add_database("db");

        let err = reconciler
            .on_event(&RuleChangeEvent::delete_table_reference(
                "db", "key", 1, "order_group",
            ))
            .unwrap_err();
        assert!(matches!(err, MetaError::ConfigurationNotFound(_)));
    }
}
