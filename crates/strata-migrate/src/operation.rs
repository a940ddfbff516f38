//! Declarative migration operations
//!
//! Provides [`MigrationOperation`], four operation kinds expressed as data and
//! interpreted twice: against whole documents ([`apply_to_document`]) and
//! against single recorded edits ([`apply_to_edit`]).

use crate::edit::StructuralEdit;
use serde_json::Value;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use strata_tree::{self as tree, Pattern, PatternError};

/// Pure value-to-value function used by [`MigrationOperation::TransformValue`]
///
/// Implement this for named, reusable conversions. Closures can be wrapped
/// with [`FnTransform`].
pub trait ValueTransform: Send + Sync + Debug {
    /// Convert one value
    fn apply(&self, value: &Value) -> Value;

    /// Describe the conversion
    fn describe(&self) -> String;
}

/// Named closure implementing [`ValueTransform`]
pub struct FnTransform<F> {
    name: String,
    f: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&Value) -> Value + Send + Sync,
{
    /// Wrap a closure under a descriptive name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Debug for FnTransform<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform").field("name", &self.name).finish()
    }
}

impl<F> ValueTransform for FnTransform<F>
where
    F: Fn(&Value) -> Value + Send + Sync,
{
    fn apply(&self, value: &Value) -> Value {
        (self.f)(value)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// One declarative migration operation
///
/// Adding a variant is a compile error in both interpreters until handled.
#[derive(Debug, Clone)]
pub enum MigrationOperation {
    /// Move every location matching `from` to the matching `to` location
    RenamePath { from: Pattern, to: Pattern },

    /// Remove every location matching `path`; edits there become no-ops
    DeletePath { path: Pattern },

    /// Fill `default_value` wherever `path` resolves and the value is absent
    AddPath { path: Pattern, default_value: Value },

    /// Replace every value matching `path` with `transform(value)`
    TransformValue {
        path: Pattern,
        transform: Arc<dyn ValueTransform>,
    },
}

impl MigrationOperation {
    /// Rename operation from pattern text
    ///
    /// # Errors
    /// Returns error if either pattern is invalid or the rename is malformed
    pub fn rename(from: &str, to: &str) -> Result<Self, OperationError> {
        let op = Self::RenamePath {
            from: from.parse()?,
            to: to.parse()?,
        };
        op.validate()?;
        Ok(op)
    }

    /// Delete operation from pattern text
    ///
    /// # Errors
    /// Returns error if the pattern is invalid
    pub fn delete(path: &str) -> Result<Self, OperationError> {
        Ok(Self::DeletePath { path: path.parse()? })
    }

    /// Add-with-default operation from pattern text
    ///
    /// # Errors
    /// Returns error if the pattern is invalid or ends in a wildcard
    pub fn add(path: &str, default_value: Value) -> Result<Self, OperationError> {
        let op = Self::AddPath {
            path: path.parse()?,
            default_value,
        };
        op.validate()?;
        Ok(op)
    }

    /// Transform operation from pattern text and a named closure
    ///
    /// # Errors
    /// Returns error if the pattern is invalid
    pub fn transform<F>(path: &str, name: &str, f: F) -> Result<Self, OperationError>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Ok(Self::TransformValue {
            path: path.parse()?,
            transform: Arc::new(FnTransform::new(name, f)),
        })
    }

    /// Check structural rules that the interpreters rely on
    ///
    /// # Errors
    /// - `WildcardArity` if a rename target has more wildcards than its source
    /// - `IdentityRename` if a rename maps a pattern onto itself
    /// - `WildcardLeaf` if an add ends in a wildcard
    pub fn validate(&self) -> Result<(), OperationError> {
        match self {
            Self::RenamePath { from, to } => {
                if to.wildcard_count() > from.wildcard_count() {
                    return Err(OperationError::WildcardArity {
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
                if from == to {
                    return Err(OperationError::IdentityRename(from.to_string()));
                }
                Ok(())
            }
            Self::AddPath { path, .. } => {
                if path.is_empty() || path.ends_with_wildcard() {
                    return Err(OperationError::WildcardLeaf(path.to_string()));
                }
                Ok(())
            }
            Self::DeletePath { .. } | Self::TransformValue { .. } => Ok(()),
        }
    }

    /// Short name of the operation kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RenamePath { .. } => "rename",
            Self::DeletePath { .. } => "delete",
            Self::AddPath { .. } => "add",
            Self::TransformValue { .. } => "transform",
        }
    }
}

/// Result of applying operations to one edit
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    /// The (possibly rewritten) edit
    pub edit: StructuralEdit,
    /// The edit's target no longer exists
    pub no_op: bool,
}

impl EditOutcome {
    /// Edit that is still live
    #[inline]
    #[must_use]
    pub fn live(edit: StructuralEdit) -> Self {
        Self { edit, no_op: false }
    }

    /// Edit whose target was removed
    #[inline]
    #[must_use]
    pub fn retired(edit: StructuralEdit) -> Self {
        Self { edit, no_op: true }
    }
}

/// Interpret one operation against a whole document
#[must_use]
pub fn apply_to_document(doc: Value, op: &MigrationOperation) -> Value {
    match op {
        MigrationOperation::RenamePath { from, to } => tree::rename_at(doc, from, to),
        MigrationOperation::DeletePath { path } => tree::delete_at(doc, path),
        MigrationOperation::AddPath {
            path,
            default_value,
        } => tree::add_default_at(doc, path, default_value),
        MigrationOperation::TransformValue { path, transform } => {
            tree::transform_at(doc, path, |v| transform.apply(v))
        }
    }
}

/// Interpret one operation against a single recorded edit
#[must_use]
pub fn apply_to_edit(mut edit: StructuralEdit, op: &MigrationOperation) -> EditOutcome {
    match op {
        MigrationOperation::RenamePath { from, to } => {
            if let Some(path) = from.remap(&edit.path, to) {
                edit.path = path;
            }
            EditOutcome::live(edit)
        }
        MigrationOperation::DeletePath { path } => {
            if path.matches(&edit.path) {
                EditOutcome::retired(edit)
            } else {
                EditOutcome::live(edit)
            }
        }
        MigrationOperation::AddPath { .. } => EditOutcome::live(edit),
        MigrationOperation::TransformValue { path, transform } => {
            if path.matches(&edit.path) {
                edit.value = edit.value.as_ref().map(|v| transform.apply(v));
            }
            EditOutcome::live(edit)
        }
    }
}

/// Left fold of [`apply_to_document`] in declaration order
#[must_use]
pub fn apply_all_to_document(doc: Value, ops: &[MigrationOperation]) -> Value {
    ops.iter().fold(doc, apply_to_document)
}

/// Left fold of [`apply_to_edit`] in declaration order
///
/// Stops at the first operation that retires the edit.
#[must_use]
pub fn apply_all_to_edit(edit: StructuralEdit, ops: &[MigrationOperation]) -> EditOutcome {
    let mut outcome = EditOutcome::live(edit);
    for op in ops {
        outcome = apply_to_edit(outcome.edit, op);
        if outcome.no_op {
            break;
        }
    }
    outcome
}

/// Errors in operation construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// Pattern text could not be parsed
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),

    /// Rename target needs more wildcards than the source provides
    #[error("rename '{from}' -> '{to}' has more wildcards in the target than the source")]
    WildcardArity { from: String, to: String },

    /// Rename onto the same pattern
    #[error("rename of '{0}' onto itself")]
    IdentityRename(String),

    /// Add must end in a literal key
    #[error("add path '{0}' must end in a literal segment")]
    WildcardLeaf(String),
}
