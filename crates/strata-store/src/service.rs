//! Load-migrate-reconcile service
//!
//! Provides [`MigrationService`], the single entry point through which stored
//! documents are read and edited. Stale documents are migrated lazily on load
//! and their edit logs reconciled in the same transaction.

use crate::config::StrataConfig;
use crate::error::StoreError;
use crate::store::{DocumentId, DocumentStore, StoredDocument};
use serde_json::Value;
use std::sync::Arc;
use strata_migrate::{
    apply_edit, schema_version, with_schema_version, MigrationRegistry, Migrator, Reconciler,
    StructuralEdit, SCHEMA_VERSION_KEY,
};

/// Service over a [`DocumentStore`]
#[derive(Debug)]
pub struct MigrationService<S> {
    store: Arc<S>,
    migrator: Migrator,
    reconciler: Reconciler,
    config: StrataConfig,
}

impl<S: DocumentStore> MigrationService<S> {
    /// Create a service
    #[must_use]
    pub fn new(store: Arc<S>, registry: Arc<MigrationRegistry>, config: StrataConfig) -> Self {
        Self {
            store,
            migrator: Migrator::new(Arc::clone(&registry)),
            reconciler: Reconciler::new(registry),
            config,
        }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    /// Version documents are migrated to
    #[inline]
    #[must_use]
    pub fn current_version(&self) -> u32 {
        self.migrator.current_version()
    }

    /// Store a new document
    ///
    /// A document without a version stamp is taken to be written at the
    /// current version.
    ///
    /// # Errors
    /// Returns `AlreadyExists` if the id is taken
    pub fn create(&self, id: &DocumentId, document: Value) -> Result<StoredDocument, StoreError> {
        if self.store.contains(id) {
            return Err(StoreError::AlreadyExists(id.clone()));
        }
        let stamped = document
            .as_object()
            .is_some_and(|map| map.contains_key(SCHEMA_VERSION_KEY));
        let document = if stamped {
            document
        } else {
            with_schema_version(document, self.current_version())
        };

        let record = StoredDocument::new(document, Vec::new());
        self.store.save(id, record.clone())?;
        tracing::debug!(document = %id, version = schema_version(&record.document), "document created");
        Ok(record)
    }

    /// Read a document, migrating it first when stale
    ///
    /// # Errors
    /// - `NotFound` if the id is unknown
    /// - `FutureVersion` if the document is newer than the registry and
    ///   `reject_future_versions` is set
    pub fn load(&self, id: &DocumentId) -> Result<StoredDocument, StoreError> {
        let record = self.store.load(id)?;
        self.check_future(&record)?;
        if !self.config.migrate_on_load || !self.needs_migration(&record) {
            return Ok(record);
        }
        self.migrate(id)
    }

    /// Migrate a document and reconcile its edit log
    ///
    /// Runs inside one store transaction and re-checks the version under the
    /// lock, so concurrent callers migrate a document exactly once.
    ///
    /// # Errors
    /// - `NotFound` if the id is unknown
    /// - `FutureVersion` as for [`load`](Self::load)
    pub fn migrate(&self, id: &DocumentId) -> Result<StoredDocument, StoreError> {
        self.store.transaction(id, |record| {
            self.check_future(record)?;
            if !self.needs_migration(record) {
                return Ok(record.clone());
            }

            let document = std::mem::take(&mut record.document);
            let (document, report) = self.migrator.migrate_with_report(document);
            record.document = document;

            let edits = std::mem::take(&mut record.edits);
            let (edits, reconciled) =
                self.reconciler
                    .reconcile_with_report(edits, report.from_version, report.to_version);
            record.edits = edits;
            record.seal();

            tracing::info!(
                document = %id,
                from_version = report.from_version,
                to_version = report.to_version,
                steps = report.steps_applied,
                rewritten = reconciled.rewritten,
                retired = reconciled.retired,
                hash = %record.hash.short(),
                "document migrated"
            );
            Ok(record.clone())
        })
    }

    /// Apply an edit authored by a client and append it to the log
    ///
    /// The document is brought to the current version first. Returns the
    /// recorded edit with its current version stamped.
    ///
    /// # Errors
    /// - `StaleClient` if the edit was authored against an older schema
    /// - `EditAhead` if the edit was authored against a newer schema
    /// - `NotFound` if the id is unknown
    pub fn submit_edit(
        &self,
        id: &DocumentId,
        mut edit: StructuralEdit,
    ) -> Result<StructuralEdit, StoreError> {
        if self.config.migrate_on_load {
            self.load(id)?;
        }

        self.store.transaction(id, |record| {
            let document_version = schema_version(&record.document);
            let edit_version = edit.original_schema_version;
            if edit_version < document_version {
                tracing::warn!(
                    document = %id,
                    edit = %edit.id,
                    edit_version,
                    document_version,
                    "rejecting edit from stale client"
                );
                return Err(StoreError::StaleClient {
                    edit_version,
                    document_version,
                });
            }
            if edit_version > document_version {
                return Err(StoreError::EditAhead {
                    edit_version,
                    document_version,
                });
            }

            edit.current_schema_version = document_version;
            let document = std::mem::take(&mut record.document);
            record.document = apply_edit(document, &edit);
            record.edits.push(edit.clone());
            record.seal();
            tracing::debug!(
                document = %id,
                edit = %edit.id,
                path = %edit.path,
                hash = %record.hash.short(),
                "edit recorded"
            );
            Ok(edit)
        })
    }

    /// Every recorded edit, no-ops included, in recorded order
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded
    pub fn audit_trail(&self, id: &DocumentId) -> Result<Vec<StructuralEdit>, StoreError> {
        Ok(self.load(id)?.edits)
    }

    /// Live edits that may be replayed against the stored document
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded
    pub fn replayable_edits(&self, id: &DocumentId) -> Result<Vec<StructuralEdit>, StoreError> {
        let record = self.load(id)?;
        let version = schema_version(&record.document);
        Ok(record
            .edits
            .into_iter()
            .filter(|edit| edit.is_replayable_at(version))
            .collect())
    }

    // Stale document, or edits left behind by an interrupted reconcile.
    fn needs_migration(&self, record: &StoredDocument) -> bool {
        let current = self.current_version();
        self.migrator.is_stale(&record.document)
            || record
                .edits
                .iter()
                .any(|edit| !edit.no_op && edit.current_schema_version < current)
    }

    fn check_future(&self, record: &StoredDocument) -> Result<(), StoreError> {
        let document_version = schema_version(&record.document);
        let current_version = self.current_version();
        if document_version > current_version && self.config.reject_future_versions {
            return Err(StoreError::FutureVersion {
                document_version,
                current_version,
            });
        }
        Ok(())
    }
}
