//! Error types for the store and service layer

use crate::store::DocumentId;

/// Store and service errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document under this id
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// Document id already taken
    #[error("document already exists: {0}")]
    AlreadyExists(DocumentId),

    /// Edit authored against an older schema than the document's
    #[error("stale client: edit authored at schema version {edit_version}, document is at {document_version}")]
    StaleClient {
        edit_version: u32,
        document_version: u32,
    },

    /// Edit authored against a newer schema than the document's
    #[error("edit authored at schema version {edit_version} is ahead of document version {document_version}")]
    EditAhead {
        edit_version: u32,
        document_version: u32,
    },

    /// Document written by a newer registry than this process knows
    #[error("document version {document_version} is newer than supported version {current_version}")]
    FutureVersion {
        document_version: u32,
        current_version: u32,
    },
}

impl StoreError {
    /// Check if the caller can recover by re-fetching the document
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleClient { .. })
    }
}
