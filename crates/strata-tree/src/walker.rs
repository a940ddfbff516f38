//! Tree walking over untyped documents
//!
//! All writers consume the document and hand back the new one. Only the
//! containers on the touched path are rebuilt; untouched siblings are moved,
//! never deep-copied. A pattern that resolves to nothing leaves the document
//! unchanged; it is never an error.

use crate::path::{ConcretePath, Pattern, PatternSegment, Segment};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Enumerate every concrete location matching `pattern`
///
/// Wildcards expand over array elements (index order) and object members
/// (key order). A literal segment that does not exist ends that branch.
#[must_use]
pub fn read_all<'a>(doc: &'a Value, pattern: &Pattern) -> Vec<(ConcretePath, &'a Value)> {
    let mut out = Vec::new();
    let mut prefix = Vec::with_capacity(pattern.len());
    collect(doc, pattern.segments(), &mut prefix, &mut out);
    out
}

fn collect<'a>(
    node: &'a Value,
    rest: &[PatternSegment],
    prefix: &mut Vec<Segment>,
    out: &mut Vec<(ConcretePath, &'a Value)>,
) {
    let Some((head, tail)) = rest.split_first() else {
        out.push((ConcretePath::new(prefix.clone()), node));
        return;
    };

    match head {
        PatternSegment::Literal(seg) => {
            if let Some((resolved, child)) = child(node, seg) {
                prefix.push(resolved);
                collect(child, tail, prefix, out);
                prefix.pop();
            }
        }
        PatternSegment::Wildcard => match node {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    prefix.push(Segment::Index(i));
                    collect(item, tail, prefix, out);
                    prefix.pop();
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    prefix.push(Segment::Key(key.clone()));
                    collect(item, tail, prefix, out);
                    prefix.pop();
                }
            }
            _ => {}
        },
    }
}

/// Resolve one literal step, normalizing the segment to the container kind
fn child<'a>(node: &'a Value, seg: &Segment) -> Option<(Segment, &'a Value)> {
    match node {
        Value::Object(map) => {
            let key = seg.as_key();
            map.get(key.as_ref())
                .map(|v| (Segment::Key(key.into_owned()), v))
        }
        Value::Array(items) => {
            let i = seg.as_index()?;
            items.get(i).map(|v| (Segment::Index(i), v))
        }
        _ => None,
    }
}

/// Read the value at a concrete location
#[must_use]
pub fn get_at<'a>(doc: &'a Value, path: &ConcretePath) -> Option<&'a Value> {
    path.iter()
        .try_fold(doc, |node, seg| child(node, seg).map(|(_, v)| v))
}

/// Check whether [`write_at`] can materialise `path` in `doc`
///
/// Missing (or null) intermediates can be created: a key creates an object,
/// index `0` creates an array. An existing array accepts indices up to its
/// length (the length itself appends). A scalar in the way blocks the write.
#[must_use]
pub fn is_writable(doc: &Value, path: &ConcretePath) -> bool {
    writable(Some(doc), path.segments())
}

fn writable(node: Option<&Value>, segs: &[Segment]) -> bool {
    let Some((head, tail)) = segs.split_first() else {
        return true;
    };

    match node {
        None | Some(Value::Null) => match head {
            Segment::Key(_) => writable(None, tail),
            Segment::Index(i) => *i == 0 && writable(None, tail),
        },
        Some(Value::Object(map)) => writable(map.get(head.as_key().as_ref()), tail),
        Some(Value::Array(items)) => match head.as_index() {
            Some(i) if i < items.len() => writable(items.get(i), tail),
            Some(i) if i == items.len() => writable(None, tail),
            _ => false,
        },
        Some(_) => false,
    }
}

/// Set the value at a concrete location, creating missing containers
///
/// If the location cannot be materialised (see [`is_writable`]) the document
/// is returned unchanged. An empty path replaces the whole document.
#[must_use]
pub fn write_at(mut doc: Value, path: &ConcretePath, value: Value) -> Value {
    if is_writable(&doc, path) {
        write_in(&mut doc, path.segments(), value);
    } else {
        tracing::trace!(path = %path, "write target unreachable");
    }
    doc
}

fn write_in(node: &mut Value, segs: &[Segment], value: Value) {
    let Some((head, tail)) = segs.split_first() else {
        *node = value;
        return;
    };

    if node.is_null() {
        *node = match head {
            Segment::Key(_) => Value::Object(Map::new()),
            Segment::Index(_) => Value::Array(Vec::new()),
        };
    }

    match node {
        Value::Object(map) => {
            let slot = map
                .entry(head.as_key().into_owned())
                .or_insert(Value::Null);
            write_in(slot, tail, value);
        }
        Value::Array(items) => {
            let Some(i) = head.as_index() else { return };
            if i == items.len() {
                items.push(Value::Null);
            }
            if let Some(slot) = items.get_mut(i) {
                write_in(slot, tail, value);
            }
        }
        _ => {}
    }
}

/// Remove every location matching `pattern`
///
/// At a wildcard the delete is mapped over every element or member; at the
/// final literal that key or index is omitted. Missing paths are a no-op.
/// The root pattern deletes nothing.
#[must_use]
pub fn delete_at(mut doc: Value, pattern: &Pattern) -> Value {
    let removed = delete_in(&mut doc, pattern.segments());
    if removed == 0 {
        tracing::trace!(pattern = %pattern, "delete matched nothing");
    }
    doc
}

/// Remove one concrete location
#[inline]
#[must_use]
pub fn delete_concrete(doc: Value, path: &ConcretePath) -> Value {
    delete_at(doc, &Pattern::from(path))
}

fn delete_in(node: &mut Value, segs: &[PatternSegment]) -> usize {
    match segs {
        [] => 0,
        [PatternSegment::Wildcard] => match node {
            Value::Array(items) => std::mem::take(items).len(),
            Value::Object(map) => std::mem::take(map).len(),
            _ => 0,
        },
        [PatternSegment::Literal(seg)] => match node {
            Value::Object(map) => usize::from(map.remove(seg.as_key().as_ref()).is_some()),
            Value::Array(items) => match seg.as_index() {
                Some(i) if i < items.len() => {
                    items.remove(i);
                    1
                }
                _ => 0,
            },
            _ => 0,
        },
        [head, tail @ ..] => match head {
            PatternSegment::Literal(seg) => child_mut(node, seg).map_or(0, |c| delete_in(c, tail)),
            PatternSegment::Wildcard => children_mut(node).map(|c| delete_in(c, tail)).sum(),
        },
    }
}

fn child_mut<'a>(node: &'a mut Value, seg: &Segment) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(seg.as_key().as_ref()),
        Value::Array(items) => seg.as_index().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

fn children_mut(node: &mut Value) -> Box<dyn Iterator<Item = &mut Value> + '_> {
    match node {
        Value::Array(items) => Box::new(items.iter_mut()),
        Value::Object(map) => Box::new(map.values_mut()),
        _ => Box::new(std::iter::empty()),
    }
}

/// Move every location matching `from` to the corresponding `to` location
///
/// Wildcards in `to` are filled positionally from the wildcard segments of
/// each `from` match. All writes happen before any delete, so `from` and `to`
/// may share a prefix. A source is deleted only once its value has been
/// written; if the target cannot be materialised the source stays.
///
/// A target nested below its own source wraps the value in place (`size` to
/// `size.value`), and a target above its source unwraps it; in both cases
/// the write already replaced the source, so nothing is deleted afterwards.
#[must_use]
pub fn rename_at(doc: Value, from: &Pattern, to: &Pattern) -> Value {
    let moves: Vec<(ConcretePath, ConcretePath, Value)> = read_all(&doc, from)
        .into_iter()
        .filter_map(|(src, value)| {
            let dst = from.remap(&src, to)?;
            Some((src, dst, value.clone()))
        })
        .collect();

    if moves.is_empty() {
        tracing::trace!(from = %from, to = %to, "rename matched nothing");
        return doc;
    }

    let mut doc = doc;
    let mut moved = Vec::with_capacity(moves.len());
    let mut targets = HashSet::with_capacity(moves.len());
    for (src, dst, value) in moves {
        let wraps = dst.len() > src.len() && dst.starts_with(&src);
        let reachable = if wraps {
            writable(None, &dst.segments()[src.len()..])
        } else {
            is_writable(&doc, &dst)
        };
        if !reachable {
            tracing::warn!(source = %src, target = %dst, "rename target blocked, keeping source");
            continue;
        }

        if wraps {
            doc = write_at(doc, &src, Value::Null);
        }
        doc = write_at(doc, &dst, value);
        if !wraps && !src.starts_with(&dst) {
            moved.push(src);
        }
        targets.insert(dst);
    }

    // Reverse so array removals do not shift pending sources.
    for src in moved.iter().rev() {
        if !targets.contains(src) {
            doc = delete_concrete(doc, src);
        }
    }
    doc
}

/// Ensure a value exists at every location `pattern` resolves to
///
/// Non-final wildcards expand over existing containers only. Missing literal
/// intermediates are created as objects when no wildcard follows them. The
/// leaf is filled with `default` only where absent, and only under object
/// parents. A pattern ending in a wildcard adds nothing.
#[must_use]
pub fn add_default_at(mut doc: Value, pattern: &Pattern, default: &Value) -> Value {
    let added = add_in(&mut doc, pattern.segments(), default);
    tracing::trace!(pattern = %pattern, added, "default fill");
    doc
}

fn add_in(node: &mut Value, segs: &[PatternSegment], default: &Value) -> usize {
    match segs {
        [] | [PatternSegment::Wildcard] => 0,
        [PatternSegment::Literal(leaf)] => match node {
            Value::Object(map) => {
                let key = leaf.as_key();
                if map.contains_key(key.as_ref()) {
                    0
                } else {
                    map.insert(key.into_owned(), default.clone());
                    1
                }
            }
            _ => 0,
        },
        [head, tail @ ..] => match head {
            PatternSegment::Wildcard => children_mut(node).map(|c| add_in(c, tail, default)).sum(),
            PatternSegment::Literal(seg) => {
                let creatable = !tail.iter().any(PatternSegment::is_wildcard);
                if creatable {
                    if let Value::Object(map) = node {
                        let slot = map
                            .entry(seg.as_key().into_owned())
                            .or_insert_with(|| Value::Object(Map::new()));
                        return add_in(slot, tail, default);
                    }
                }
                child_mut(node, seg).map_or(0, |c| add_in(c, tail, default))
            }
        },
    }
}

/// Replace the value at every location matching `pattern` with `f(value)`
#[must_use]
pub fn transform_at<F>(doc: Value, pattern: &Pattern, f: F) -> Value
where
    F: Fn(&Value) -> Value,
{
    let updates: Vec<(ConcretePath, Value)> = read_all(&doc, pattern)
        .into_iter()
        .map(|(path, value)| (path, f(value)))
        .collect();

    updates
        .into_iter()
        .fold(doc, |doc, (path, value)| write_at(doc, &path, value))
}
