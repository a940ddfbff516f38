//! Edit-log reconciliation
//!
//! Provides [`Reconciler`], which rewrites recorded edits so they stay valid
//! against a migrated document. Retired edits are flagged, never dropped.

use crate::edit::StructuralEdit;
use crate::operation::EditOutcome;
use crate::registry::MigrationRegistry;
use std::sync::Arc;

/// Counts from one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Edits carried to the target version with a changed path or value
    pub rewritten: usize,
    /// Edits carried to the target version unchanged
    pub unchanged: usize,
    /// Edits newly flagged as no-ops
    pub retired: usize,
    /// Edits left alone (already no-op, or already at the target version)
    pub skipped: usize,
}

/// Carries recorded edits across schema versions
#[derive(Debug, Clone)]
pub struct Reconciler {
    registry: Arc<MigrationRegistry>,
}

impl Reconciler {
    /// Create a reconciler over a registry
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<MigrationRegistry>) -> Self {
        Self { registry }
    }

    /// Rewrite `edits` to match `to_version`
    ///
    /// Each edit is carried from its own `current_schema_version`;
    /// `from_version` only labels the batch in logs and never changes the
    /// result.
    #[must_use]
    pub fn reconcile(
        &self,
        edits: Vec<StructuralEdit>,
        from_version: u32,
        to_version: u32,
    ) -> Vec<StructuralEdit> {
        self.reconcile_with_report(edits, from_version, to_version).0
    }

    /// Rewrite edits and report what happened to them
    ///
    /// Every step in the range applies in version order: declarative steps
    /// through their operations, imperative steps through their edit policy.
    /// Edits already at `to_version` or already flagged are skipped, and an
    /// edit at a version other than `from_version` is carried from its own
    /// version, so re-running after an interrupted pass converges.
    #[must_use]
    pub fn reconcile_with_report(
        &self,
        edits: Vec<StructuralEdit>,
        from_version: u32,
        to_version: u32,
    ) -> (Vec<StructuralEdit>, ReconcileReport) {
        let current = self.registry.current_version();
        let to_version = if to_version > current {
            tracing::warn!(
                requested = to_version,
                current_version = current,
                "reconcile target beyond registry, clamping"
            );
            current
        } else {
            to_version
        };

        let mut report = ReconcileReport::default();
        let reconciled: Vec<StructuralEdit> = edits
            .into_iter()
            .map(|edit| self.carry(edit, from_version, to_version, &mut report))
            .collect();

        tracing::debug!(
            from_version,
            to_version,
            rewritten = report.rewritten,
            unchanged = report.unchanged,
            retired = report.retired,
            skipped = report.skipped,
            "edit log reconciled"
        );
        (reconciled, report)
    }

    fn carry(
        &self,
        edit: StructuralEdit,
        from_version: u32,
        to_version: u32,
        report: &mut ReconcileReport,
    ) -> StructuralEdit {
        if edit.no_op || edit.current_schema_version >= to_version {
            report.skipped += 1;
            return edit;
        }
        if edit.current_schema_version != from_version {
            tracing::debug!(
                edit = %edit.id,
                edit_version = edit.current_schema_version,
                from_version,
                "edit not at batch version, carrying from its own version"
            );
        }

        let before = (edit.path.clone(), edit.value.clone());
        let mut outcome = EditOutcome::live(edit);
        let start = outcome.edit.current_schema_version;
        for (version, step) in self.registry.steps_for_range(start, to_version) {
            outcome = step.apply_to_edit(outcome.edit);
            if outcome.no_op {
                tracing::debug!(
                    edit = %outcome.edit.id,
                    version,
                    step = step.name(),
                    "edit retired"
                );
                break;
            }
        }

        let mut edit = outcome.edit;
        if outcome.no_op {
            edit.no_op = true;
            report.retired += 1;
            return edit;
        }

        if (&edit.path, &edit.value) == (&before.0, &before.1) {
            report.unchanged += 1;
        } else {
            report.rewritten += 1;
        }
        edit.current_schema_version = to_version;
        edit
    }
}
