//! # Rule Change Hub
//!
//! Routes incoming [`RuleChangeEvent`]s to the reconciler registered for
//! their domain and carries the resulting [`RuleConfigurationChanged`]
//! events out on a broadcast channel.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use heddle_meta::{EventHub, RuleChangeEvent};
//!
//! let hub = EventHub::new();
//! heddle_meta::reconcile::install(&hub, registry, oracle);
//!
//! // Watch republished configurations
//! let mut rx = hub.subscribe_changes();
//!
//! // Feed a change notification
//! hub.dispatch(&RuleChangeEvent::add_table("sharding_db", key, 1, rule))?;
//!
//! let changed = rx.recv().await?;
//! println!("{} tables", changed.config.tables.len());
//! ```

use crate::error::{MetaError, Result};
use crate::events::{ConfigDomain, RuleChangeEvent, RuleConfigurationChanged};
use dashmap::DashMap;
use heddle_core::ShardingRuleConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default capacity of the changed-configuration channel.
pub const DEFAULT_CHANGE_CAPACITY: usize = 256;

/// What a reconciler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The change was merged (or was a republish-only trigger) and the
    /// configuration was republished
    Applied,
    /// The change was below the active version and discarded
    Stale,
}

/// Handler for rule change events of one domain.
pub trait RuleChangeSubscriber: Send + Sync {
    /// Domain this subscriber handles.
    fn domain(&self) -> ConfigDomain;

    /// Apply one event.
    fn on_event(&self, event: &RuleChangeEvent) -> Result<ReconcileOutcome>;
}

/// Dispatch and publish statistics.
#[derive(Debug, Default)]
pub struct HubStats {
    /// Events handed to dispatch
    dispatched: AtomicU64,
    /// Events applied by a reconciler
    applied: AtomicU64,
    /// Events discarded as stale
    stale: AtomicU64,
    /// Events whose reconciler returned an error
    failed: AtomicU64,
    /// Events with no subscriber for their domain
    unrouted: AtomicU64,
    /// Configurations published on the changed channel
    published: AtomicU64,
    /// Publishes with no subscriber listening
    dropped: AtomicU64,
}

impl HubStats {
    fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_unrouted(&self) {
        self.unrouted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_published(&self, dropped: bool) {
        self.published.fetch_add(1, Ordering::Relaxed);
        if dropped {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get dispatched count.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Get applied count.
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Get stale count.
    pub fn stale(&self) -> u64 {
        self.stale.load(Ordering::Relaxed)
    }

    /// Get failed count.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Get unrouted count.
    pub fn unrouted(&self) -> u64 {
        self.unrouted.load(Ordering::Relaxed)
    }

    /// Get published count.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Get dropped publish count.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> HubStatsSnapshot {
        HubStatsSnapshot {
            dispatched: self.dispatched(),
            applied: self.applied(),
            stale: self.stale(),
            failed: self.failed(),
            unrouted: self.unrouted(),
            published: self.published(),
            dropped: self.dropped(),
        }
    }
}

/// Point-in-time hub statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HubStatsSnapshot {
    pub dispatched: u64,
    pub applied: u64,
    pub stale: u64,
    pub failed: u64,
    pub unrouted: u64,
    pub published: u64,
    pub dropped: u64,
}

/// Sending half of the changed-configuration channel.
///
/// Cheap to clone; every clone feeds the same channel and the same stats.
#[derive(Clone)]
pub struct ChangedSender {
    tx: broadcast::Sender<RuleConfigurationChanged>,
    stats: Arc<HubStats>,
}

impl ChangedSender {
    /// Publish a full configuration for a database.
    ///
    /// A publish with nobody listening is counted, not an error.
    pub fn publish(&self, database: &str, config: ShardingRuleConfig) {
        let dropped = self
            .tx
            .send(RuleConfigurationChanged {
                database: database.to_string(),
                config,
            })
            .is_err();
        self.stats.record_published(dropped);

        if dropped {
            debug!(database, "configuration published with no subscribers");
        }
    }
}

/// Rule change hub.
///
/// One subscriber slot per domain; registering a domain again replaces the
/// previous subscriber, so wiring is idempotent.
pub struct EventHub {
    subscribers: DashMap<ConfigDomain, Arc<dyn RuleChangeSubscriber>>,
    changed_tx: broadcast::Sender<RuleConfigurationChanged>,
    stats: Arc<HubStats>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    /// Create a hub with the default changed-channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANGE_CAPACITY)
    }

    /// Create a hub with a custom changed-channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (changed_tx, _) = broadcast::channel(capacity);
        Self {
            subscribers: DashMap::new(),
            changed_tx,
            stats: Arc::new(HubStats::default()),
        }
    }

    /// Get statistics.
    pub fn stats(&self) -> &Arc<HubStats> {
        &self.stats
    }

    /// Register a subscriber for its domain, replacing any previous one.
    pub fn register(&self, subscriber: Arc<dyn RuleChangeSubscriber>) {
        let domain = subscriber.domain();
        if self.subscribers.insert(domain, subscriber).is_some() {
            debug!(%domain, "replaced rule change subscriber");
        }
    }

    /// Whether a domain has a subscriber.
    pub fn has_subscriber(&self, domain: ConfigDomain) -> bool {
        self.subscribers.contains_key(&domain)
    }

    /// Subscribe to republished configurations.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<RuleConfigurationChanged> {
        self.changed_tx.subscribe()
    }

    /// Number of changed-configuration subscribers.
    pub fn change_subscriber_count(&self) -> usize {
        self.changed_tx.receiver_count()
    }

    /// Sender handle for republishing configurations through this hub.
    pub fn changed_sender(&self) -> ChangedSender {
        ChangedSender {
            tx: self.changed_tx.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Route one event to its domain's subscriber.
    pub fn dispatch(&self, event: &RuleChangeEvent) -> Result<ReconcileOutcome> {
        self.stats.record_dispatched();

        let domain = event.op.domain();
        let subscriber = match self.subscribers.get(&domain) {
            Some(entry) => Arc::clone(entry.value()),
            None => {
                self.stats.record_unrouted();
                warn!(%domain, kind = event.op.kind(), "no subscriber for rule change domain");
                return Err(MetaError::SubscriberMissing(domain.to_string()));
            }
        };

        let result = subscriber.on_event(event);
        match &result {
            Ok(ReconcileOutcome::Applied) => {
                self.stats.record_applied();
                debug!(
                    database = %event.database,
                    kind = event.op.kind(),
                    version = event.version,
                    "rule change applied"
                );
            }
            Ok(ReconcileOutcome::Stale) => {
                self.stats.record_stale();
                debug!(
                    database = %event.database,
                    kind = event.op.kind(),
                    version = event.version,
                    "stale rule change discarded"
                );
            }
            Err(e) => {
                self.stats.record_failed();
                warn!(
                    database = %event.database,
                    kind = event.op.kind(),
                    error = %e,
                    "rule change failed"
                );
            }
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
