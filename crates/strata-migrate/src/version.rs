//! Schema version field of a document

use serde_json::Value;

/// Document field holding the schema version
pub const SCHEMA_VERSION_KEY: &str = "schemaVersion";

/// Version a document was written at
///
/// Absent, non-numeric, or zero versions read as `1`.
#[must_use]
pub fn schema_version(doc: &Value) -> u32 {
    doc.get(SCHEMA_VERSION_KEY)
        .and_then(Value::as_u64)
        .map_or(1, |v| u32::try_from(v).unwrap_or(u32::MAX).max(1))
}

/// Stamp the schema version onto an object document
///
/// Non-object roots cannot carry a version and are returned unchanged.
#[must_use]
pub fn with_schema_version(mut doc: Value, version: u32) -> Value {
    match &mut doc {
        Value::Object(map) => {
            map.insert(SCHEMA_VERSION_KEY.to_owned(), Value::from(version));
        }
        _ => tracing::warn!("document root is not an object, version not stamped"),
    }
    doc
}
