//! Edit replay
//!
//! Applies recorded edits to a document. Only live edits reconciled to the
//! document's own version are eligible.

use crate::edit::StructuralEdit;
use crate::version::schema_version;
use serde_json::Value;
use strata_tree as tree;

/// Counts from one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Edits applied
    pub applied: usize,
    /// Edits skipped because they are flagged no-op
    pub skipped_no_op: usize,
    /// Edits skipped because they target another schema version
    pub skipped_version: usize,
}

/// Apply one edit: set its value, or remove its path when it has none
#[must_use]
pub fn apply_edit(doc: Value, edit: &StructuralEdit) -> Value {
    match &edit.value {
        Some(value) => tree::write_at(doc, &edit.path, value.clone()),
        None => tree::delete_concrete(doc, &edit.path),
    }
}

/// Apply every eligible edit in order
#[must_use]
pub fn replay(doc: Value, edits: &[StructuralEdit]) -> (Value, ReplayReport) {
    let version = schema_version(&doc);
    let mut report = ReplayReport::default();

    let doc = edits.iter().fold(doc, |doc, edit| {
        if edit.no_op {
            report.skipped_no_op += 1;
            doc
        } else if edit.current_schema_version != version {
            report.skipped_version += 1;
            doc
        } else {
            report.applied += 1;
            apply_edit(doc, edit)
        }
    });

    if report.skipped_version > 0 {
        tracing::warn!(
            skipped = report.skipped_version,
            document_version = version,
            "replay skipped edits at another schema version"
        );
    }
    (doc, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn edit(path: &str, value: Option<Value>, version: u32) -> StructuralEdit {
        let path = path.parse().unwrap();
        match value {
            Some(v) => StructuralEdit::set(path, v, version),
            None => StructuralEdit::remove(path, version),
        }
    }

    #[test]
    fn applies_set_and_remove() {
        let doc = json!({"schemaVersion": 2, "a": [{"x": 1}]});
        let edits = vec![
            edit("a.0.y", Some(json!(5)), 2),
            edit("a.0.x", None, 2),
        ];
        let (doc, report) = replay(doc, &edits);
        assert_eq!(doc, json!({"schemaVersion": 2, "a": [{"y": 5}]}));
        assert_eq!(report.applied, 2);
    }

    #[test]
    fn skips_no_op_and_other_versions() {
        let doc = json!({"schemaVersion": 2});
        let mut dead = edit("a", Some(json!(1)), 2);
        dead.no_op = true;
        let stale = edit("b", Some(json!(1)), 1);
        let (out, report) = replay(doc.clone(), &[dead, stale]);
        assert_eq!(out, doc);
        assert_eq!(report.skipped_no_op, 1);
        assert_eq!(report.skipped_version, 1);
        assert_eq!(report.applied, 0);
    }
}
