//! Recorded structural edits
//!
//! A [`StructuralEdit`] is one atomic mutation against a document, kept in the
//! edit log for replay and audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strata_tree::ConcretePath;
use ulid::Ulid;

/// One recorded mutation against a document
///
/// # Invariants
/// - `original_schema_version` never changes after creation
/// - a document only replays an edit whose `current_schema_version` equals its
///   own `schemaVersion` and which is not flagged `no_op`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralEdit {
    /// Stable identifier (sortable by creation time)
    pub id: Ulid,

    /// Target location
    pub path: ConcretePath,

    /// New value; absent for removals
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub value: Option<Value>,

    /// Version the edit was authored against
    pub original_schema_version: u32,

    /// Version the edit has been rewritten to match
    pub current_schema_version: u32,

    /// Target was removed by a migration; kept for audit, never replayed
    #[serde(default)]
    pub no_op: bool,

    /// When the edit was recorded
    pub recorded_at: DateTime<Utc>,
}

/// `null` is a real value for an edit, not an absent one
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// What an edit does at its path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Set or add a value
    Set,
    /// Remove the value
    Remove,
}

impl StructuralEdit {
    fn new(path: ConcretePath, value: Option<Value>, schema_version: u32) -> Self {
        Self {
            id: Ulid::new(),
            path,
            value,
            original_schema_version: schema_version,
            current_schema_version: schema_version,
            no_op: false,
            recorded_at: Utc::now(),
        }
    }

    /// Edit setting `value` at `path`, authored against `schema_version`
    #[inline]
    #[must_use]
    pub fn set(path: ConcretePath, value: Value, schema_version: u32) -> Self {
        Self::new(path, Some(value), schema_version)
    }

    /// Edit removing `path`, authored against `schema_version`
    #[inline]
    #[must_use]
    pub fn remove(path: ConcretePath, schema_version: u32) -> Self {
        Self::new(path, None, schema_version)
    }

    /// Kind of mutation
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EditKind {
        if self.value.is_some() {
            EditKind::Set
        } else {
            EditKind::Remove
        }
    }

    /// Check if a document at `schema_version` may replay this edit
    #[inline]
    #[must_use]
    pub fn is_replayable_at(&self, schema_version: u32) -> bool {
        !self.no_op && self.current_schema_version == schema_version
    }
}
