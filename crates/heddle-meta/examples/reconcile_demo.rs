use std::sync::Arc;

use heddle_core::{rule_nodes, ShardingAutoTableRule, ShardingTableRule, TableReferenceRule};
use heddle_meta::{install, DatabaseRegistry, EventHub, MemoryVersionOracle, RuleChangeEvent};

/// Reconciliation walkthrough
///
/// Feeds versioned rule changes for one logical database through the hub and
/// prints every republished snapshot, including a stale change that the
/// version gate discards.
///
/// Run with:
/// ```
/// cargo run --example reconcile_demo
/// ```
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let hub = EventHub::new();
    let registry = Arc::new(DatabaseRegistry::new());
    let oracle = Arc::new(MemoryVersionOracle::new());
    registry.add_database("sharding_db");
    install(&hub, registry.clone(), oracle.clone());

    let mut changes = hub.subscribe_changes();

    println!("Applying initial rules for sharding_db...");
    let initial = [
        RuleChangeEvent::add_table(
            "sharding_db",
            "rules/sharding/tables/t_order",
            0,
            ShardingTableRule::new("t_order", "ds_${0..1}.t_order_${0..1}"),
        ),
        RuleChangeEvent::add_auto_table(
            "sharding_db",
            "rules/sharding/auto_tables/t_order_item",
            0,
            ShardingAutoTableRule::new("t_order_item", "ds_0,ds_1"),
        ),
        RuleChangeEvent::add_table_reference(
            "sharding_db",
            "rules/sharding/table_references/ref_0",
            0,
            TableReferenceRule::new("ref_0", "t_order,t_order_item"),
        ),
    ];
    for event in initial {
        let outcome = hub.dispatch(&event)?;
        println!("  {} -> {:?}", event.op.kind(), outcome);
    }

    println!("Replaying an already superseded change...");
    oracle.set_active("rules/sharding/tables/t_order", 5);
    let stale = RuleChangeEvent::alter_table(
        "sharding_db",
        "rules/sharding/tables/t_order",
        3,
        "t_order",
        ShardingTableRule::new("t_order", "ds_0.t_order"),
    );
    println!("  v3 against active v5 -> {:?}", hub.dispatch(&stale)?);

    let fresh = RuleChangeEvent::alter_table(
        "sharding_db",
        "rules/sharding/tables/t_order",
        5,
        "t_order",
        ShardingTableRule::new("t_order", "ds_${0..3}.t_order_${0..3}"),
    );
    println!("  v5 against active v5 -> {:?}", hub.dispatch(&fresh)?);

    println!("Updating the broadcast table set...");
    let database = registry.require("sharding_db")?;
    if let Some(rules) = database.sharding() {
        rules.set_broadcast_tables(vec!["t_config".to_string()]);
    }
    let broadcast = RuleChangeEvent::alter_broadcast(
        "sharding_db",
        "rules/sharding/broadcast",
        0,
        vec!["t_config".to_string()],
    );
    println!("  {} -> {:?}", broadcast.op.kind(), hub.dispatch(&broadcast)?);

    println!("\nRepublished snapshots:");
    let mut last = None;
    while let Ok(changed) = changes.try_recv() {
        println!(
            "  {}: {} tables, {} auto tables, {} references, {} broadcast",
            changed.database,
            changed.config.tables.len(),
            changed.config.auto_tables.len(),
            changed.config.table_references.len(),
            changed.config.broadcast_tables.len(),
        );
        last = Some(changed);
    }

    if let Some(changed) = last {
        println!("\nPersisted nodes of the final snapshot:");
        for node in rule_nodes(&changed.config)? {
            println!("  {}", node.path);
        }
    }

    Ok(())
}
