//! Strata Store - Transactional document access with lazy migration
//!
//! Documents are read through [`MigrationService`], which migrates stale
//! documents and reconciles their edit logs under a per-document lock before
//! handing them out, and guards the write path against stale clients.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use strata_migrate::{MigrationOperation, MigrationRegistry};
//! use strata_store::{DocumentId, DocumentStore, InMemoryStore, MigrationService, StoredDocument, StrataConfig};
//!
//! let registry = MigrationRegistry::builder()
//!     .declarative("rename", vec![MigrationOperation::rename("old", "new").unwrap()])
//!     .build()
//!     .unwrap();
//! let store = Arc::new(InMemoryStore::new());
//! let id = DocumentId::from("plan");
//! store
//!     .save(&id, StoredDocument::new(json!({"schemaVersion": 1, "old": 1}), vec![]))
//!     .unwrap();
//!
//! let service = MigrationService::new(store, Arc::new(registry), StrataConfig::default());
//! let record = service.load(&id).unwrap();
//! assert_eq!(record.document, json!({"schemaVersion": 2, "new": 1}));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod telemetry;

pub use config::{ConfigError, LoggingConfig, StrataConfig};
pub use error::StoreError;
pub use service::MigrationService;
pub use store::{DocumentId, DocumentStore, InMemoryStore, StoredDocument};
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
