//! Version 1 to 2: legacy beds grouped by row
//!
//! Version 1 stored beds as an object keyed by bed name, each carrying the
//! name of its `row`. Version 2 stores a `beds` array with stable ids and a
//! separate `bedGroups` array, one group per distinct row.

use serde_json::{json, Map, Value};
use std::collections::HashSet;
use strata_migrate::{EditRewrite, ImperativeMigration, StructuralEdit};
use uuid::Uuid;

/// Row name given to beds that never had one
pub const UNASSIGNED_ROW: &str = "Unassigned";

/// Deterministic id of a bed, derived from its name
#[must_use]
pub fn bed_id(name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("bed:{name}").as_bytes())
}

/// Deterministic id of a bed group, derived from its row name
#[must_use]
pub fn group_id(row: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("bed-group:{row}").as_bytes())
}

/// Imperative step turning the bed map into beds plus groups
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupLegacyBeds;

impl ImperativeMigration for GroupLegacyBeds {
    fn migrate_document(&self, mut doc: Value) -> Value {
        let Some(root) = doc.as_object_mut() else {
            return doc;
        };
        let legacy = match root.remove("beds") {
            Some(Value::Object(legacy)) => legacy,
            Some(other) => {
                root.insert("beds".into(), other);
                return doc;
            }
            None => return doc,
        };

        let mut groups: Vec<Value> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let beds: Vec<Value> = legacy
            .into_iter()
            .map(|(name, bed)| {
                let mut fields = match bed {
                    Value::Object(fields) => fields,
                    _ => Map::new(),
                };
                let row = match fields.remove("row") {
                    Some(Value::String(row)) => row,
                    _ => UNASSIGNED_ROW.to_owned(),
                };
                let group = group_id(&row).to_string();
                if seen.insert(row.clone()) {
                    groups.push(json!({"id": group, "name": row}));
                }

                fields.insert("id".into(), json!(bed_id(&name).to_string()));
                fields.insert("name".into(), json!(name));
                fields.insert("groupId".into(), json!(group));
                Value::Object(fields)
            })
            .collect();

        tracing::debug!(beds = beds.len(), groups = groups.len(), "grouped legacy beds");
        root.insert("beds".into(), Value::Array(beds));
        root.insert("bedGroups".into(), Value::Array(groups));
        doc
    }

    // Every segment under a version 1 `beds` is a bed name, digits included.
    fn rewrite_edit(&self, mut edit: StructuralEdit) -> EditRewrite {
        if edit.path.first().is_some_and(|seg| seg.as_key() == "beds") {
            return EditRewrite::Retire(edit);
        }
        if edit.path.is_empty() {
            if let Some(doc) = edit.value.take() {
                edit.value = Some(self.migrate_document(doc));
                return EditRewrite::Rewrite(edit);
            }
        }
        EditRewrite::Keep(edit)
    }
}
