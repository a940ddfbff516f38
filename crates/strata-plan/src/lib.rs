//! Strata Plan - Schema history of the garden plan document
//!
//! Every schema change ever published for the plan document, as one
//! [`MigrationRegistry`]. Steps are append-only: a released step is never
//! edited, only followed by another.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use strata_migrate::Migrator;
//!
//! let migrator = Migrator::new(Arc::new(strata_plan::plan_registry().unwrap()));
//! let doc = migrator.migrate(json!({"schemaVersion": 5, "plantings": [{"bedLength": 100}]}));
//! assert_eq!(doc["plantings"][0]["footprint"]["length"], json!(100));
//! assert_eq!(doc["schemaVersion"], json!(strata_plan::CURRENT_VERSION));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod beds;
pub mod schedule;

pub use beds::GroupLegacyBeds;
pub use schedule::MergeStartDay;

use serde_json::{json, Value};
use strata_migrate::{MigrationOperation, MigrationRegistry, OperationError, RegistryError};

/// Schema version produced by [`plan_registry`]
pub const CURRENT_VERSION: u32 = 6;

/// Feet of bed per legacy bed count
pub const FEET_PER_BED: i64 = 50;

/// Build the plan document's migration registry
///
/// # Errors
/// Returns error if a published operation fails validation
pub fn plan_registry() -> Result<MigrationRegistry, RegistryError> {
    let registry = MigrationRegistry::builder()
        .imperative("group legacy beds", GroupLegacyBeds)
        .declarative(BEDS_TO_FEET, beds_to_feet().map_err(invalid(2, BEDS_TO_FEET))?)
        .imperative("merge start week/day", MergeStartDay)
        .declarative(RENAME_FIELDS, rename_fields().map_err(invalid(4, RENAME_FIELDS))?)
        .declarative(NEST_FOOTPRINT, nest_footprint().map_err(invalid(5, NEST_FOOTPRINT))?)
        .build()?;
    debug_assert_eq!(registry.current_version(), CURRENT_VERSION);
    Ok(registry)
}

const BEDS_TO_FEET: &str = "beds count to feet";
const RENAME_FIELDS: &str = "rename crop and bed fields";
const NEST_FOOTPRINT: &str = "nest bed footprint";

fn invalid(version: u32, name: &'static str) -> impl Fn(OperationError) -> RegistryError {
    move |source| RegistryError::InvalidOperation {
        version,
        name: name.to_owned(),
        source,
    }
}

// Integers that would overflow are scaled as floats.
#[allow(clippy::cast_precision_loss)]
fn scale_bed_count(value: &Value) -> Value {
    if let Some(feet) = value.as_i64().and_then(|n| n.checked_mul(FEET_PER_BED)) {
        json!(feet)
    } else if let Some(f) = value.as_f64() {
        if value.is_i64() || value.is_u64() {
            tracing::warn!(beds = %value, "bed count too large for integer feet, scaling as float");
        }
        json!(f * FEET_PER_BED as f64)
    } else {
        value.clone()
    }
}

fn beds_to_feet() -> Result<Vec<MigrationOperation>, OperationError> {
    Ok(vec![
        MigrationOperation::transform("plantings.*.bedsCount", "beds x 50 ft", scale_bed_count)?,
        MigrationOperation::rename("plantings.*.bedsCount", "plantings.*.bedFeet")?,
    ])
}

fn rename_fields() -> Result<Vec<MigrationOperation>, OperationError> {
    Ok(vec![
        MigrationOperation::rename("crops.*.dtm", "crops.*.daysToMaturity")?,
        MigrationOperation::rename("plantings.*.bedFeet", "plantings.*.bedLength")?,
        MigrationOperation::delete("plantings.*.legacyNotes")?,
        MigrationOperation::add("settings.units", json!("feet"))?,
    ])
}

fn nest_footprint() -> Result<Vec<MigrationOperation>, OperationError> {
    Ok(vec![MigrationOperation::rename(
        "plantings.*.bedLength",
        "plantings.*.footprint.length",
    )?])
}
