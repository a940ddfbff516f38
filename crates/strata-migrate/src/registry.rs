//! Migration registry
//!
//! Provides [`MigrationRegistry`], the ordered, immutable list of published
//! migration steps. It is built once at startup and handed to the
//! [`Migrator`](crate::Migrator) and [`Reconciler`](crate::Reconciler).

use crate::operation::{MigrationOperation, OperationError};
use crate::step::{ImperativeMigration, MigrationStep};
use std::sync::Arc;

/// Ordered collection of migration steps
///
/// # Invariants
/// - step `i` (0-based) migrates documents from version `i + 1` to `i + 2`
/// - `current_version() == steps.len() + 1`
/// - every declarative operation has passed [`MigrationOperation::validate`]
#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    steps: Vec<MigrationStep>,
}

impl MigrationRegistry {
    /// Start building a registry
    #[inline]
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry with no steps (current version 1)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Schema version every document migrates to
    #[inline]
    #[must_use]
    pub fn current_version(&self) -> u32 {
        u32::try_from(self.steps.len()).map_or(u32::MAX, |n| n.saturating_add(1))
    }

    /// Number of published steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if no steps are published
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step migrating documents away from `from_version`
    #[inline]
    #[must_use]
    pub fn step_for(&self, from_version: u32) -> Option<&MigrationStep> {
        let index = usize::try_from(from_version.checked_sub(1)?).ok()?;
        self.steps.get(index)
    }

    /// Steps covering `[from, to)`, paired with their `from` version
    pub fn steps_for_range(
        &self,
        from: u32,
        to: u32,
    ) -> impl Iterator<Item = (u32, &MigrationStep)> + '_ {
        (from.max(1)..to).map_while(move |v| self.step_for(v).map(|step| (v, step)))
    }

    /// Declarative operations registered for `[from, to)`, in version order
    ///
    /// Imperative versions contribute nothing here; their edit policy lives on
    /// the step itself (see [`steps_for_range`](Self::steps_for_range)).
    #[must_use]
    pub fn operations_for_range(&self, from: u32, to: u32) -> Vec<&MigrationOperation> {
        self.steps_for_range(from, to)
            .flat_map(|(_, step)| step.operations())
            .collect()
    }

    /// Iterate all steps in version order
    pub fn iter(&self) -> impl Iterator<Item = &MigrationStep> {
        self.steps.iter()
    }
}

/// Builder for constructing registries
///
/// Steps are appended in version order; the first step migrates version 1.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    steps: Vec<MigrationStep>,
}

impl RegistryBuilder {
    /// Create new builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a declarative step
    #[inline]
    #[must_use]
    pub fn declarative(
        mut self,
        name: impl Into<String>,
        operations: Vec<MigrationOperation>,
    ) -> Self {
        self.steps.push(MigrationStep::Declarative {
            name: name.into(),
            operations,
        });
        self
    }

    /// Append an imperative step
    #[inline]
    #[must_use]
    pub fn imperative<M>(mut self, name: impl Into<String>, migration: M) -> Self
    where
        M: ImperativeMigration + 'static,
    {
        self.steps.push(MigrationStep::Imperative {
            name: name.into(),
            migration: Arc::new(migration),
        });
        self
    }

    /// Append an already constructed step
    #[inline]
    #[must_use]
    pub fn step(mut self, step: MigrationStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Validate and freeze the registry
    ///
    /// # Errors
    /// - `EmptyStep` if a declarative step has no operations
    /// - `InvalidOperation` if an operation fails validation
    pub fn build(self) -> Result<MigrationRegistry, RegistryError> {
        for (version, step) in (1u32..).zip(&self.steps) {
            if let MigrationStep::Declarative { name, operations } = step {
                if operations.is_empty() {
                    return Err(RegistryError::EmptyStep {
                        version,
                        name: name.clone(),
                    });
                }
                for op in operations {
                    op.validate().map_err(|source| RegistryError::InvalidOperation {
                        version,
                        name: name.clone(),
                        source,
                    })?;
                }
            }
        }

        tracing::debug!(
            steps = self.steps.len(),
            current_version = self.steps.len() + 1,
            "migration registry built"
        );
        Ok(MigrationRegistry { steps: self.steps })
    }
}

/// Errors in registry construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Declarative step without operations
    #[error("step '{name}' (from version {version}) has no operations")]
    EmptyStep { version: u32, name: String },

    /// Operation failed validation
    #[error("step '{name}' (from version {version}): {source}")]
    InvalidOperation {
        version: u32,
        name: String,
        source: OperationError,
    },
}
