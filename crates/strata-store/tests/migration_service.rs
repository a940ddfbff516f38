//! Service-level behavior under concurrency, stale clients and interrupted passes

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strata_migrate::{
    EditRewrite, ImperativeMigration, MigrationOperation, MigrationRegistry, StructuralEdit,
};
use strata_store::{DocumentStore, StoreError};
use strata_test_utils::{doc_id, remove_edit, seeded_store, service, set_edit, simple_document};

#[derive(Debug, Default)]
struct CountingStep {
    runs: Arc<AtomicUsize>,
}

impl ImperativeMigration for CountingStep {
    fn migrate_document(&self, mut doc: Value) -> Value {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(map) = doc.as_object_mut() {
            map.insert("touched".into(), json!(true));
        }
        doc
    }

    fn rewrite_edit(&self, edit: StructuralEdit) -> EditRewrite {
        EditRewrite::Keep(edit)
    }
}

fn chain(names: &[(&str, &str)]) -> MigrationRegistry {
    names
        .iter()
        .fold(MigrationRegistry::builder(), |builder, (from, to)| {
            builder.declarative(
                format!("{from} to {to}"),
                vec![MigrationOperation::rename(from, to).unwrap()],
            )
        })
        .build()
        .unwrap()
}

#[test]
fn concurrent_loads_migrate_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let registry = MigrationRegistry::builder()
        .imperative(
            "touch",
            CountingStep {
                runs: Arc::clone(&runs),
            },
        )
        .build()
        .unwrap();
    let id = doc_id("shared");
    let svc = service(seeded_store(&id, simple_document(1), vec![]), registry);

    let documents: Vec<Value> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| svc.load(&id).unwrap().document))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    for doc in documents {
        assert_eq!(doc, json!({"schemaVersion": 2, "title": "plan", "touched": true}));
    }
}

#[test]
fn stale_client_edit_is_rejected() {
    let registry = chain(&[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")]);
    assert_eq!(registry.current_version(), 5);
    let id = doc_id("plan");
    let svc = service(seeded_store(&id, json!({"schemaVersion": 5, "e": 1}), vec![]), registry);

    let err = svc.submit_edit(&id, set_edit("c", json!(2), 3)).unwrap_err();
    assert!(matches!(
        err,
        StoreError::StaleClient {
            edit_version: 3,
            document_version: 5
        }
    ));
    assert!(err.is_retryable());

    let record = svc.load(&id).unwrap();
    assert_eq!(record.document, json!({"schemaVersion": 5, "e": 1}));
    assert!(record.edits.is_empty());
}

#[test]
fn retired_edits_stay_in_audit_trail_only() {
    let registry = MigrationRegistry::builder()
        .declarative(
            "drop legacy",
            vec![MigrationOperation::delete("legacy").unwrap()],
        )
        .build()
        .unwrap();
    let id = doc_id("plan");
    let edits = vec![
        set_edit("legacy", json!("old"), 1),
        set_edit("title", json!("renamed"), 1),
    ];
    let svc = service(
        seeded_store(&id, json!({"schemaVersion": 1, "legacy": "old", "title": "renamed"}), edits),
        registry,
    );

    let audit = svc.audit_trail(&id).unwrap();
    assert_eq!(audit.len(), 2);
    assert!(audit[0].no_op);
    assert_eq!(audit[0].current_schema_version, 1);
    assert!(!audit[1].no_op);
    assert_eq!(audit[1].current_schema_version, 2);

    let replayable = svc.replayable_edits(&id).unwrap();
    assert_eq!(replayable.len(), 1);
    assert_eq!(replayable[0].path.to_string(), "title");
}

#[test]
fn interrupted_reconcile_resumes() {
    let registry = chain(&[("a", "b"), ("b", "c")]);
    let id = doc_id("plan");
    // Document already migrated but one edit was never carried forward.
    let edits = vec![set_edit("a", json!(1), 1), set_edit("c", json!(2), 3)];
    let svc = service(seeded_store(&id, json!({"schemaVersion": 3, "c": 2}), edits), registry);

    let record = svc.load(&id).unwrap();
    assert_eq!(record.document, json!({"schemaVersion": 3, "c": 2}));
    let paths: Vec<(String, u32)> = record
        .edits
        .iter()
        .map(|e| (e.path.to_string(), e.current_schema_version))
        .collect();
    assert_eq!(paths, vec![("c".to_owned(), 3), ("c".to_owned(), 3)]);

    let again = svc.load(&id).unwrap();
    assert_eq!(again, record);
}

#[test]
fn submit_after_migration_records_current_version() {
    let registry = chain(&[("title", "name")]);
    let id = doc_id("plan");
    let svc = service(seeded_store(&id, simple_document(1), vec![]), registry);

    let recorded = svc.submit_edit(&id, remove_edit("name", 2)).unwrap();
    assert_eq!(recorded.current_schema_version, 2);
    assert_eq!(recorded.original_schema_version, 2);

    let stored = svc.store().load(&id).unwrap();
    assert_eq!(stored.document, json!({"schemaVersion": 2}));
    assert_eq!(stored.edits, vec![recorded]);
    assert!(stored.verify());
}
