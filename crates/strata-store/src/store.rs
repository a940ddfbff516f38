//! Document storage
//!
//! Provides the [`DocumentStore`] seam and [`InMemoryStore`], a store that
//! serializes access per document id with a mutex.

use crate::error::StoreError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use strata_migrate::StructuralEdit;
use strata_tree::DocumentHash;

/// Identifier of a stored document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create new id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A document together with its edit log
///
/// # Invariants
/// - after every commit `hash == DocumentHash::of(&document)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Document tree
    pub document: Value,
    /// Every recorded edit, in recorded order, including no-ops
    pub edits: Vec<StructuralEdit>,
    /// Fingerprint of `document` at last commit
    pub hash: DocumentHash,
}

impl StoredDocument {
    /// Create a record (computes the hash)
    #[inline]
    #[must_use]
    pub fn new(document: Value, edits: Vec<StructuralEdit>) -> Self {
        let hash = DocumentHash::of(&document);
        Self {
            document,
            edits,
            hash,
        }
    }

    /// Recompute the hash after in-place changes
    #[inline]
    pub fn seal(&mut self) {
        self.hash = DocumentHash::of(&self.document);
    }

    /// Check the hash against the document (detects torn writes)
    #[inline]
    #[must_use]
    pub fn verify(&self) -> bool {
        self.hash == DocumentHash::of(&self.document)
    }
}

/// Storage collaborator
///
/// `transaction` is the locking primitive: while `f` runs no other
/// transaction, load or save for the same id proceeds, and the record is
/// committed only if `f` returns `Ok`.
pub trait DocumentStore: Send + Sync {
    /// Read a committed record
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown
    fn load(&self, id: &DocumentId) -> Result<StoredDocument, StoreError>;

    /// Atomically replace (or create) a record
    ///
    /// # Errors
    /// Implementations may fail on backend errors
    fn save(&self, id: &DocumentId, record: StoredDocument) -> Result<(), StoreError>;

    /// Run `f` with exclusive access to a record, committing on success
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown, or the error from `f`
    fn transaction<T, F>(&self, id: &DocumentId, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut StoredDocument) -> Result<T, StoreError>;

    /// Check if a record exists
    fn contains(&self, id: &DocumentId) -> bool;
}

/// In-process store keyed by document id
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: DashMap<DocumentId, Arc<Mutex<StoredDocument>>>,
}

impl InMemoryStore {
    /// Create new empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // Clone the slot out so the shard lock is released before the mutex is taken.
    fn slot(&self, id: &DocumentId) -> Result<Arc<Mutex<StoredDocument>>, StoreError> {
        self.records
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

impl DocumentStore for InMemoryStore {
    fn load(&self, id: &DocumentId) -> Result<StoredDocument, StoreError> {
        let slot = self.slot(id)?;
        let record = slot.lock().clone();
        Ok(record)
    }

    fn save(&self, id: &DocumentId, mut record: StoredDocument) -> Result<(), StoreError> {
        record.seal();
        let slot = match self.records.entry(id.clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(record)));
                return Ok(());
            }
        };
        *slot.lock() = record;
        Ok(())
    }

    fn transaction<T, F>(&self, id: &DocumentId, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut StoredDocument) -> Result<T, StoreError>,
    {
        let slot = self.slot(id)?;
        let mut guard = slot.lock();
        let mut working = guard.clone();
        let out = f(&mut working)?;
        working.seal();
        *guard = working;
        Ok(out)
    }

    fn contains(&self, id: &DocumentId) -> bool {
        self.records.contains_key(id)
    }
}
