//! Migration driver
//!
//! Provides [`Migrator`], which brings a document from whatever version it was
//! written at up to the registry's current version.

use crate::registry::MigrationRegistry;
use crate::version::{schema_version, with_schema_version};
use serde_json::Value;
use std::sync::Arc;

/// Summary of one migration pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version the document was read at
    pub from_version: u32,
    /// Version the document ends at
    pub to_version: u32,
    /// Number of steps applied
    pub steps_applied: u32,
}

impl MigrationReport {
    /// Check if the pass changed nothing
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.steps_applied == 0
    }
}

/// Runs registered steps over stale documents
///
/// Stateless apart from the shared registry; cheap to clone.
#[derive(Debug, Clone)]
pub struct Migrator {
    registry: Arc<MigrationRegistry>,
}

impl Migrator {
    /// Create a migrator over a registry
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<MigrationRegistry>) -> Self {
        Self { registry }
    }

    /// Registry in use
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Version documents are migrated to
    #[inline]
    #[must_use]
    pub fn current_version(&self) -> u32 {
        self.registry.current_version()
    }

    /// Check if a document needs migrating
    #[inline]
    #[must_use]
    pub fn is_stale(&self, doc: &Value) -> bool {
        schema_version(doc) < self.current_version()
    }

    /// Migrate a document to the current version
    ///
    /// Documents already at (or beyond) the current version are returned
    /// unchanged.
    #[must_use]
    pub fn migrate(&self, doc: Value) -> Value {
        self.migrate_with_report(doc).0
    }

    /// Migrate a document and report what was done
    ///
    /// Each step applies to the accumulating document in version order, so a
    /// pass interrupted at any version resumes correctly from the version
    /// the document was last stamped with.
    #[must_use]
    pub fn migrate_with_report(&self, doc: Value) -> (Value, MigrationReport) {
        let from_version = schema_version(&doc);
        let current = self.current_version();

        if from_version >= current {
            if from_version > current {
                tracing::warn!(
                    document_version = from_version,
                    current_version = current,
                    "document is newer than this registry, leaving unchanged"
                );
            }
            return (
                doc,
                MigrationReport {
                    from_version,
                    to_version: from_version,
                    steps_applied: 0,
                },
            );
        }

        tracing::info!(from_version, to_version = current, "migrating document");

        let mut doc = doc;
        let mut steps_applied = 0;
        for (version, step) in self.registry.steps_for_range(from_version, current) {
            tracing::debug!(version, step = step.name(), "applying migration step");
            doc = step.apply_to_document(doc);
            steps_applied += 1;
        }

        let doc = with_schema_version(doc, current);
        (
            doc,
            MigrationReport {
                from_version,
                to_version: current,
                steps_applied,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::MigrationOperation;
    use crate::step::{EditRewrite, ImperativeMigration};
    use crate::StructuralEdit;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    /// Stamps a wrong version; the driver must override it.
    #[derive(Debug)]
    struct StampsGarbage;

    impl ImperativeMigration for StampsGarbage {
        fn migrate_document(&self, doc: Value) -> Value {
            with_schema_version(doc, 99)
        }

        fn rewrite_edit(&self, edit: StructuralEdit) -> EditRewrite {
            EditRewrite::Keep(edit)
        }
    }

    fn migrator() -> Migrator {
        let registry = MigrationRegistry::builder()
            .declarative(
                "feet",
                vec![
                    MigrationOperation::transform("bedsCount", "x50", |v| {
                        json!(v.as_i64().unwrap_or(0) * 50)
                    })
                    .unwrap(),
                    MigrationOperation::rename("bedsCount", "bedFeet").unwrap(),
                ],
            )
            .imperative("garbage", StampsGarbage)
            .declarative("units", vec![MigrationOperation::add("units", json!("ft")).unwrap()])
            .build()
            .unwrap();
        Migrator::new(Arc::new(registry))
    }

    #[test]
    fn migrates_from_absent_version() {
        let (doc, report) = migrator().migrate_with_report(json!({"bedsCount": 2}));
        assert_eq!(
            doc,
            json!({"bedFeet": 100, "units": "ft", "schemaVersion": 4})
        );
        assert_eq!(report.from_version, 1);
        assert_eq!(report.to_version, 4);
        assert_eq!(report.steps_applied, 3);
    }

    #[test]
    fn resumes_from_intermediate_version() {
        let (doc, report) =
            migrator().migrate_with_report(json!({"bedsCount": 2, "schemaVersion": 3}));
        assert_eq!(report.steps_applied, 1);
        assert_eq!(doc, json!({"bedsCount": 2, "units": "ft", "schemaVersion": 4}));
    }

    #[test]
    fn current_document_is_identity() {
        let doc = json!({"anything": [1, 2], "schemaVersion": 4});
        let (out, report) = migrator().migrate_with_report(doc.clone());
        assert_eq!(out, doc);
        assert!(report.is_identity());
    }

    #[test]
    fn future_document_is_identity() {
        let doc = json!({"schemaVersion": 12});
        assert_eq!(migrator().migrate(doc.clone()), doc);
        assert!(!migrator().is_stale(&doc));
    }

    #[test]
    fn empty_registry_stamps_nothing() {
        let m = Migrator::new(Arc::new(MigrationRegistry::empty()));
        let doc = json!({"a": 1});
        assert_eq!(m.migrate(doc.clone()), doc);
    }

    fn arb_doc() -> impl Strategy<Value = Value> {
        (
            proptest::option::of(0i64..10),
            proptest::option::of(1u32..6),
            proptest::option::of("[a-z]{0,4}"),
        )
            .prop_map(|(beds, version, units)| {
                let mut doc = json!({});
                if let Some(b) = beds {
                    doc["bedsCount"] = json!(b);
                }
                if let Some(v) = version {
                    doc["schemaVersion"] = json!(v);
                }
                if let Some(u) = units {
                    doc["units"] = json!(u);
                }
                doc
            })
    }

    proptest! {
        #[test]
        fn prop_migrate_is_idempotent(doc in arb_doc()) {
            let m = migrator();
            let once = m.migrate(doc);
            let twice = m.migrate(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_migrate_reaches_current_version(doc in arb_doc()) {
            let m = migrator();
            let input_version = schema_version(&doc);
            prop_assume!(input_version <= m.current_version());
            prop_assert_eq!(schema_version(&m.migrate(doc)), m.current_version());
        }
    }
}
