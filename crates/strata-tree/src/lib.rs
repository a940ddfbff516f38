//! Strata Tree
//!
//! Wildcard path patterns and copy-on-write walking of untyped document trees.
//!
//! # Core Concepts
//!
//! - [`ConcretePath`]: One location inside a document (`plantings.0.bedFeet`)
//! - [`Pattern`]: A class of locations with `*` segments (`plantings.*.bedFeet`)
//! - [`matches`]: Exact-depth, string-coerced pattern matching
//! - [`read_all`], [`write_at`], [`delete_at`], [`rename_at`]: Tree walker
//! - [`DocumentHash`]: Blake3 fingerprint of a document
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use strata_tree::{rename_at, Pattern};
//!
//! let doc = json!({"a": [{"x": 1}, {"x": 2}]});
//! let from: Pattern = "a.*.x".parse().unwrap();
//! let to: Pattern = "a.*.y".parse().unwrap();
//! assert_eq!(rename_at(doc, &from, &to), json!({"a": [{"y": 1}, {"y": 2}]}));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod hash;
mod path;
mod walker;

pub use hash::{DocumentHash, HashError};
pub use path::{matches, Captures, ConcretePath, Pattern, PatternError, PatternSegment, Segment};
pub use walker::{
    add_default_at, delete_at, delete_concrete, get_at, is_writable, read_all, rename_at,
    transform_at, write_at,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
