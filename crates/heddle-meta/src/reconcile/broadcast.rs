//! Broadcast table reconciliation

use super::{domain_mismatch, ReconcilerContext};
use crate::error::Result;
use crate::events::{ConfigDomain, RuleChangeEvent, RuleChangeOp};
use crate::hub::{ChangedSender, ReconcileOutcome, RuleChangeSubscriber};
use crate::registry::DatabaseRegistry;
use crate::version::VersionOracle;
use heddle_core::ShardingRuleConfig;
use std::sync::Arc;

/// Republishes the configuration when the broadcast table set changes.
///
/// The broadcast set itself is written straight onto the rule set via
/// [`ShardingRuleSet::set_broadcast_tables`](crate::ruleset::ShardingRuleSet::set_broadcast_tables)
/// before the event fires, so the handlers only snapshot and republish.
/// Add tolerates a database with no rule set and publishes an empty
/// configuration without installing one; alter and delete require an
/// installed rule set.
pub struct BroadcastTableReconciler {
    ctx: ReconcilerContext,
}

impl BroadcastTableReconciler {
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

impl RuleChangeSubscriber for BroadcastTableReconciler {
    fn domain(&self) -> ConfigDomain {
        ConfigDomain::Broadcast
    }

    fn on_event(&self, event: &RuleChangeEvent) -> Result<ReconcileOutcome> {
        if self.ctx.is_stale(event) {
            return Ok(ReconcileOutcome::Stale);
        }
        let database = self.ctx.database(&event.database)?;
        let lock = self.ctx.lock(&event.database);
        let _guard = lock.lock();

        let snapshot = match &event.op {
            RuleChangeOp::AddBroadcast(_) => database
                .sharding()
                .map(|rules| rules.snapshot())
                .unwrap_or_else(ShardingRuleConfig::new),
            RuleChangeOp::AlterBroadcast(_) | RuleChangeOp::DeleteBroadcast => {
                self.ctx.require_rules(&database)?.snapshot()
            }
            other => return Err(domain_mismatch(ConfigDomain::Broadcast, other)),
        };

        self.ctx.publish(&event.database, snapshot);
        Ok(ReconcileOutcome::Applied)
    }
}
