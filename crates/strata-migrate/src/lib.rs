//! Strata Migrate
//!
//! Versioned document migration and edit-log reconciliation.
//!
//! # Core Concepts
//!
//! - [`MigrationOperation`]: Rename, delete, add-with-default, transform-value as data
//! - [`ImperativeMigration`]: Hand-written step with a mandatory edit policy
//! - [`MigrationRegistry`]: Ordered, immutable list of published steps
//! - [`Migrator`]: Brings a document up to the current schema version
//! - [`Reconciler`]: Keeps recorded [`StructuralEdit`]s valid across versions
//! - [`replay`]: Applies live, current edits to a document
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use strata_migrate::{MigrationOperation, MigrationRegistry, Migrator};
//!
//! let registry = MigrationRegistry::builder()
//!     .declarative("rename x", vec![MigrationOperation::rename("a.*.x", "a.*.y").unwrap()])
//!     .build()
//!     .unwrap();
//! let migrator = Migrator::new(Arc::new(registry));
//!
//! let doc = migrator.migrate(json!({"a": [{"x": 1}]}));
//! assert_eq!(doc, json!({"a": [{"y": 1}], "schemaVersion": 2}));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod driver;
mod edit;
mod operation;
mod reconcile;
mod registry;
mod replay;
mod step;
mod version;

pub use driver::{MigrationReport, Migrator};
pub use edit::{EditKind, StructuralEdit};
pub use operation::{
    apply_all_to_document, apply_all_to_edit, apply_to_document, apply_to_edit, EditOutcome,
    FnTransform, MigrationOperation, OperationError, ValueTransform,
};
pub use reconcile::{ReconcileReport, Reconciler};
pub use registry::{MigrationRegistry, RegistryBuilder, RegistryError};
pub use replay::{apply_edit, replay, ReplayReport};
pub use step::{EditRewrite, ImperativeMigration, MigrationStep};
pub use version::{schema_version, with_schema_version, SCHEMA_VERSION_KEY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
