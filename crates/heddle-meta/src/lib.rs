//! # Heddle Meta
//!
//! Sharding rule metadata runtime for Heddle with:
//! - **Version-gated reconciliation**: stale change notifications are discarded
//!   against an external version oracle
//! - **Per-domain reconcilers**: tables, auto tables, table references and
//!   broadcast tables each merge with their own semantics
//! - **Full-state republish**: every applied change emits the complete current
//!   configuration, never a diff
//!
//! ## Architecture
//!
//! ```text
//!                       ┌──────────────────────────────────────┐
//!  RuleChangeEvent      │               EventHub               │
//! ─────────────────────▶│  route by domain        stats        │
//!                       └──────┬───────────────────────▲───────┘
//!                              │                       │ RuleConfigurationChanged
//!             ┌────────────────┼────────────────┐      │
//!             ▼                ▼                ▼      │
//!       ┌──────────┐    ┌──────────┐     ┌──────────┐  │
//!       │  tables  │    │   auto   │ ... │ broadcast│──┘
//!       │reconciler│    │  tables  │     │reconciler│
//!       └────┬─────┘    └────┬─────┘     └────┬─────┘
//!            │ gate → lock → merge → snapshot │
//!            ▼                ▼               ▼
//!       ┌─────────────────────────────────────────┐
//!       │ DatabaseRegistry → LogicalDatabase      │
//!       │      └─ ShardingRuleSet (live state)    │
//!       └─────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use heddle_meta::{reconcile, DatabaseRegistry, EventHub, MemoryVersionOracle, RuleChangeEvent};
//! use heddle_core::ShardingTableRule;
//! use std::sync::Arc;
//!
//! let hub = EventHub::new();
//! let registry = Arc::new(DatabaseRegistry::new());
//! let oracle = Arc::new(MemoryVersionOracle::new());
//! registry.add_database("sharding_db");
//! reconcile::install(&hub, registry.clone(), oracle.clone());
//!
//! let mut changes = hub.subscribe_changes();
//!
//! let rule = ShardingTableRule::new("t_order", "ds_${0..1}.t_order_${0..1}");
//! hub.dispatch(&RuleChangeEvent::add_table(
//!     "sharding_db",
//!     "rules/sharding/tables/t_order",
//!     1,
//!     rule,
//! ))?;
//!
//! let changed = changes.blocking_recv()?;
//! assert_eq!(changed.config.tables.len(), 1);
//! ```

pub mod error;
pub mod events;
pub mod hub;
pub mod reconcile;
pub mod registry;
pub mod ruleset;
pub mod version;

// Re-export main types
pub use error::{MetaError, Result};
pub use events::{ConfigDomain, RuleChangeEvent, RuleChangeOp, RuleConfigurationChanged};
pub use hub::{
    ChangedSender, EventHub, HubStats, HubStatsSnapshot, ReconcileOutcome, RuleChangeSubscriber,
    DEFAULT_CHANGE_CAPACITY,
};
pub use reconcile::{
    install, AutoTableRuleReconciler, BroadcastTableReconciler, TableReferenceReconciler,
    TableRuleReconciler,
};
pub use registry::{DatabaseRegistry, LogicalDatabase};
pub use ruleset::ShardingRuleSet;
pub use version::{MemoryVersionOracle, VersionOracle};

/// Re-export common types
pub mod prelude {
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::hub::*;
    pub use crate::reconcile::install;
    pub use crate::registry::*;
    pub use crate::ruleset::*;
    pub use crate::version::*;
}
