//! Testing utilities for Strata workspace
//!
//! Shared fixtures, edit constructors, and store setup.

#![allow(missing_docs)]

use serde_json::{json, Value};
use std::sync::Arc;
use strata_migrate::{MigrationRegistry, StructuralEdit};
use strata_store::{
    DocumentId, DocumentStore, InMemoryStore, MigrationService, StoredDocument, StrataConfig,
};
use strata_tree::ConcretePath;

pub fn path(text: &str) -> ConcretePath {
    text.parse().unwrap()
}

pub fn set_edit(target: &str, value: Value, version: u32) -> StructuralEdit {
    StructuralEdit::set(path(target), value, version)
}

pub fn remove_edit(target: &str, version: u32) -> StructuralEdit {
    StructuralEdit::remove(path(target), version)
}

/// Edit already flagged as retired at `version`
pub fn retired_edit(target: &str, value: Value, version: u32) -> StructuralEdit {
    let mut edit = set_edit(target, value, version);
    edit.no_op = true;
    edit
}

/// A garden plan as first written, before any migration
pub fn sample_plan_v1() -> Value {
    json!({
        "schemaVersion": 1,
        "beds": {
            "A1": {"row": "North", "width": 30},
            "A2": {"row": "North", "width": 30},
            "B1": {"row": "South", "width": 36}
        },
        "crops": [
            {"name": "Carrot", "dtm": 70},
            {"name": "Lettuce", "dtm": 45}
        ],
        "plantings": [
            {
                "crop": "Carrot",
                "bedsCount": 2,
                "startWeek": 3,
                "startDay": 2,
                "legacyNotes": "sow thinly"
            },
            {
                "crop": "Lettuce",
                "bedsCount": 1,
                "startWeek": 1,
                "startDay": 1
            }
        ],
        "settings": {}
    })
}

/// A document with a single string field, at `version`
pub fn simple_document(version: u32) -> Value {
    json!({"schemaVersion": version, "title": "plan"})
}

pub fn doc_id(name: &str) -> DocumentId {
    DocumentId::from(name)
}

/// Store holding one record under `id`
pub fn seeded_store(id: &DocumentId, document: Value, edits: Vec<StructuralEdit>) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.save(id, StoredDocument::new(document, edits)).unwrap();
    store
}

pub fn service(
    store: Arc<InMemoryStore>,
    registry: MigrationRegistry,
) -> MigrationService<InMemoryStore> {
    MigrationService::new(store, Arc::new(registry), StrataConfig::default())
}
