//! Replaying reconciled edits after migration matches migrating after replay

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use strata_migrate::{replay, MigrationOperation, MigrationRegistry, Migrator, Reconciler};
use strata_test_utils::{remove_edit, retired_edit, set_edit};

fn registry() -> Arc<MigrationRegistry> {
    Arc::new(
        MigrationRegistry::builder()
            .declarative(
                "counts",
                vec![
                    MigrationOperation::rename("list.*.n", "list.*.count").unwrap(),
                    MigrationOperation::transform("list.*.count", "double", |v| {
                        v.as_i64().map_or_else(|| v.clone(), |n| json!(n * 2))
                    })
                    .unwrap(),
                ],
            )
            .declarative(
                "title",
                vec![
                    MigrationOperation::rename("title", "name").unwrap(),
                    MigrationOperation::add("tags", json!([])).unwrap(),
                ],
            )
            .build()
            .unwrap(),
    )
}

fn document() -> Value {
    json!({
        "schemaVersion": 1,
        "title": "plan",
        "list": [{"n": 1}, {"n": 2}, {"n": 3}]
    })
}

#[test]
fn replay_then_migrate_equals_migrate_then_replay() {
    let registry = registry();
    let migrator = Migrator::new(Arc::clone(&registry));
    let reconciler = Reconciler::new(registry);
    let edits = vec![
        set_edit("list.1.n", json!(5), 1),
        set_edit("title", json!("renamed"), 1),
        remove_edit("list.2.n", 1),
    ];

    let (edited, report) = replay(document(), &edits);
    assert_eq!(report.applied, 3);
    let expected = migrator.migrate(edited);

    let migrated = migrator.migrate(document());
    let reconciled = reconciler.reconcile(edits, 1, migrator.current_version());
    let (actual, report) = replay(migrated, &reconciled);
    assert_eq!(report.applied, 3);

    assert_eq!(actual, expected);
    assert_eq!(
        actual,
        json!({
            "schemaVersion": 3,
            "name": "renamed",
            "tags": [],
            "list": [{"count": 2}, {"count": 10}, {}]
        })
    );
}

#[test]
fn retired_edits_are_not_replayed() {
    let migrator = Migrator::new(registry());
    let doc = migrator.migrate(document());
    let edits = vec![retired_edit("name", json!("ghost"), 3)];

    let (replayed, report) = replay(doc.clone(), &edits);
    assert_eq!(replayed, doc);
    assert_eq!(report.skipped_no_op, 1);
}

#[test]
fn wrapping_rename_keeps_values_and_edits() {
    let registry = Arc::new(
        MigrationRegistry::builder()
            .declarative(
                "wrap size",
                vec![MigrationOperation::rename("p.*.size", "p.*.size.value").unwrap()],
            )
            .build()
            .unwrap(),
    );
    let migrator = Migrator::new(Arc::clone(&registry));
    let reconciler = Reconciler::new(registry);
    let doc = json!({"schemaVersion": 1, "p": [{"size": {"w": 3}}, {"size": 4}]});
    let edits = vec![set_edit("p.0.size", json!(7), 1)];

    let migrated = migrator.migrate(doc.clone());
    assert_eq!(
        migrated,
        json!({"schemaVersion": 2, "p": [{"size": {"value": {"w": 3}}}, {"size": {"value": 4}}]})
    );

    let reconciled = reconciler.reconcile(edits.clone(), 1, 2);
    assert_eq!(reconciled[0].path.to_string(), "p.0.size.value");

    let (actual, _) = replay(migrated, &reconciled);
    let (edited, _) = replay(doc, &edits);
    assert_eq!(actual, migrator.migrate(edited));
}
