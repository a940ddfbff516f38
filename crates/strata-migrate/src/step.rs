//! Migration steps
//!
//! A [`MigrationStep`] moves a document from one schema version to the next,
//! either as a list of declarative operations or as an imperative function.

use crate::edit::StructuralEdit;
use crate::operation::{apply_all_to_document, apply_all_to_edit, EditOutcome, MigrationOperation};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Hand-written migration for shapes declarative operations cannot express
///
/// # Contract
/// - Works on the untyped tree only; never on a typed model of the document,
///   so its behavior stays frozen as the current shape evolves
/// - Idempotent against its own output: a document that already has the new
///   shape must come back unchanged
/// - Never fails; a panic here is a defect in the step
///
/// Every imperative step must also say what happens to edits recorded before
/// it through [`rewrite_edit`](Self::rewrite_edit).
pub trait ImperativeMigration: Send + Sync + Debug {
    /// Transform the whole document
    fn migrate_document(&self, doc: Value) -> Value;

    /// Carry one recorded edit across this step
    fn rewrite_edit(&self, edit: StructuralEdit) -> EditRewrite;
}

/// Edit policy decision of an imperative step
#[derive(Debug, Clone, PartialEq)]
pub enum EditRewrite {
    /// Edit's path is unaffected by the step
    Keep(StructuralEdit),
    /// Edit was remapped onto the new shape
    Rewrite(StructuralEdit),
    /// Edit's target no longer exists; keep for audit only
    Retire(StructuralEdit),
}

impl From<EditRewrite> for EditOutcome {
    fn from(rewrite: EditRewrite) -> Self {
        match rewrite {
            EditRewrite::Keep(edit) | EditRewrite::Rewrite(edit) => Self::live(edit),
            EditRewrite::Retire(edit) => Self::retired(edit),
        }
    }
}

/// One published migration, addressed by its `from` version
///
/// Steps are append-only: once released a step is never edited or removed,
/// only superseded by a later one.
#[derive(Debug, Clone)]
pub enum MigrationStep {
    /// Operations applied as a left fold
    Declarative {
        name: String,
        operations: Vec<MigrationOperation>,
    },

    /// Hand-written document function plus its edit policy
    Imperative {
        name: String,
        migration: Arc<dyn ImperativeMigration>,
    },
}

impl MigrationStep {
    /// Step name (for logs and audit)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Declarative { name, .. } | Self::Imperative { name, .. } => name,
        }
    }

    /// Declarative operations of this step (empty for imperative steps)
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &[MigrationOperation] {
        match self {
            Self::Declarative { operations, .. } => operations,
            Self::Imperative { .. } => &[],
        }
    }

    /// Check if this step is imperative
    #[inline]
    #[must_use]
    pub fn is_imperative(&self) -> bool {
        matches!(self, Self::Imperative { .. })
    }

    /// Migrate a document across this step
    #[must_use]
    pub fn apply_to_document(&self, doc: Value) -> Value {
        match self {
            Self::Declarative { operations, .. } => apply_all_to_document(doc, operations),
            Self::Imperative { migration, .. } => migration.migrate_document(doc),
        }
    }

    /// Carry a recorded edit across this step
    #[must_use]
    pub fn apply_to_edit(&self, edit: StructuralEdit) -> EditOutcome {
        match self {
            Self::Declarative { operations, .. } => apply_all_to_edit(edit, operations),
            Self::Imperative { migration, .. } => migration.rewrite_edit(edit).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct WrapScalar;

    impl ImperativeMigration for WrapScalar {
        fn migrate_document(&self, mut doc: Value) -> Value {
            if let Some(n) = doc.get("n").filter(|v| !v.is_object()).cloned() {
                doc["n"] = json!({ "value": n });
            }
            doc
        }

        fn rewrite_edit(&self, mut edit: StructuralEdit) -> EditRewrite {
            if edit.path.to_string() == "n" {
                edit.path = "n.value".parse().unwrap_or(edit.path);
                EditRewrite::Rewrite(edit)
            } else {
                EditRewrite::Keep(edit)
            }
        }
    }

    fn imperative() -> MigrationStep {
        MigrationStep::Imperative {
            name: "wrap n".into(),
            migration: Arc::new(WrapScalar),
        }
    }

    #[test]
    fn imperative_step_document() {
        let step = imperative();
        let once = step.apply_to_document(json!({"n": 4}));
        assert_eq!(once, json!({"n": {"value": 4}}));
        assert_eq!(step.apply_to_document(once.clone()), once);
        assert!(step.is_imperative());
        assert!(step.operations().is_empty());
    }

    #[test]
    fn imperative_step_edit_policy() {
        let step = imperative();
        let edit = StructuralEdit::set("n".parse().unwrap(), json!(1), 1);
        let outcome = step.apply_to_edit(edit);
        assert!(!outcome.no_op);
        assert_eq!(outcome.edit.path.to_string(), "n.value");
    }

    #[test]
    fn retire_maps_to_no_op() {
        let edit = StructuralEdit::remove("x".parse().unwrap(), 1);
        let outcome: EditOutcome = EditRewrite::Retire(edit).into();
        assert!(outcome.no_op);
    }

    #[test]
    fn declarative_step_name_and_ops() {
        let step = MigrationStep::Declarative {
            name: "rename".into(),
            operations: vec![MigrationOperation::rename("a", "b").unwrap()],
        };
        assert_eq!(step.name(), "rename");
        assert_eq!(step.operations().len(), 1);
        assert_eq!(step.apply_to_document(json!({"a": 1})), json!({"b": 1}));
    }
}
