//! Version 3 to 4: start week and day merged into a day of year

use serde_json::{json, Value};
use strata_migrate::{EditRewrite, ImperativeMigration, StructuralEdit};

const LEGACY_FIELDS: [&str; 2] = ["startWeek", "startDay"];

/// Day of year from a 1-based week and a day within it
///
/// Returns `None` when the result does not fit in an `i64`.
#[inline]
#[must_use]
pub fn day_of_year(week: i64, day: i64) -> Option<i64> {
    week.checked_sub(1)?.checked_mul(7)?.checked_add(day)
}

/// Imperative step replacing `startWeek`/`startDay` with `startDayOfYear`
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeStartDay;

impl MergeStartDay {
    fn merge(planting: &mut Value) {
        let Some(fields) = planting.as_object_mut() else {
            return;
        };
        if fields.contains_key("startDayOfYear") {
            return;
        }
        let week = fields.get("startWeek").and_then(Value::as_i64);
        let day = fields.get("startDay").and_then(Value::as_i64);
        let (Some(week), Some(day)) = (week, day) else {
            return;
        };
        let Some(start) = day_of_year(week, day) else {
            tracing::warn!(week, day, "start day out of range, leaving planting unchanged");
            return;
        };

        fields.insert("startDayOfYear".into(), json!(start));
        for key in LEGACY_FIELDS {
            fields.remove(key);
        }
    }

    fn merge_all(plantings: &mut Value) {
        match plantings {
            Value::Array(items) => items.iter_mut().for_each(Self::merge),
            Value::Object(items) => items.values_mut().for_each(Self::merge),
            _ => {}
        }
    }
}

impl ImperativeMigration for MergeStartDay {
    fn migrate_document(&self, mut doc: Value) -> Value {
        if let Some(plantings) = doc.get_mut("plantings") {
            Self::merge_all(plantings);
        }
        doc
    }

    // Edits replacing a planting, the plantings list, or the document carry
    // legacy fields in their value; those values are merged like the document.
    fn rewrite_edit(&self, mut edit: StructuralEdit) -> EditRewrite {
        let segments = edit.path.segments();
        let under_plantings = segments.first().is_some_and(|seg| seg.as_key() == "plantings");
        let legacy_field = segments.len() == 3
            && under_plantings
            && LEGACY_FIELDS.iter().any(|field| segments[2].as_key() == *field);
        if legacy_field {
            return EditRewrite::Retire(edit);
        }

        let depth = segments.len();
        if depth > 0 && !(under_plantings && depth <= 2) {
            return EditRewrite::Keep(edit);
        }
        let Some(value) = edit.value.as_mut() else {
            return EditRewrite::Keep(edit);
        };

        let before = value.clone();
        match depth {
            0 => {
                if let Some(plantings) = value.get_mut("plantings") {
                    Self::merge_all(plantings);
                }
            }
            1 => Self::merge_all(value),
            _ => Self::merge(value),
        }
        if *value == before {
            EditRewrite::Keep(edit)
        } else {
            EditRewrite::Rewrite(edit)
        }
    }
}
