//! Concrete paths and wildcard patterns
//!
//! Provides [`ConcretePath`] for addressing one location inside a document tree
//! and [`Pattern`] for describing a class of locations with `*` segments.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One step into a document tree
///
/// Keys address object members, indices address array elements. Comparison
/// between segments for matching purposes is string-coerced, see
/// [`Segment::coerced_eq`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Array index
    Index(usize),
    /// Object key
    Key(String),
}

impl Segment {
    /// Create a key segment
    #[inline]
    #[must_use]
    pub fn key(k: impl Into<String>) -> Self {
        Self::Key(k.into())
    }

    /// Create an index segment
    #[inline]
    #[must_use]
    pub fn index(i: usize) -> Self {
        Self::Index(i)
    }

    /// Segment as an object key (indices are rendered in decimal)
    #[inline]
    #[must_use]
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Self::Key(k) => Cow::Borrowed(k),
            Self::Index(i) => Cow::Owned(i.to_string()),
        }
    }

    /// Segment as an array index, if it is one or is a key spelled in digits
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Key(k) => parse_index(k),
        }
    }

    /// String-coerced equality: `Index(0)` equals `Key("0")`
    #[inline]
    #[must_use]
    pub fn coerced_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Index(a), Self::Index(b)) => a == b,
            (Self::Key(a), Self::Key(b)) => a == b,
            _ => self.as_key() == other.as_key(),
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Self::Key(s.to_owned())
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Self::Key(s)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

fn parse_index(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_segment(s: &str) -> Segment {
    parse_index(s).map_or_else(|| Segment::Key(s.to_owned()), Segment::Index)
}

/// Fully concrete location inside a document
///
/// # Examples
/// - `["plantings", 0, "bedFeet"]` → `plantings.0.bedFeet`
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcretePath(Vec<Segment>);

impl ConcretePath {
    /// Create path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Empty path (document root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Append a key segment, returning the extended path
    #[inline]
    #[must_use]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Segment::Key(k.into()));
        self
    }

    /// Append an index segment, returning the extended path
    #[inline]
    #[must_use]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Segment::Index(i));
        self
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is the root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First segment, if any
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&Segment> {
        self.0.first()
    }

    /// Last segment, if any
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.split_last().map(|(_, rest)| Self(rest.to_vec()))
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.0.iter()
    }

    /// Check if `prefix` addresses this location or one of its ancestors
    #[inline]
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        prefix.len() <= self.len()
            && prefix.iter().zip(self.iter()).all(|(a, b)| a.coerced_eq(b))
    }
}

impl Display for ConcretePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            Display::fmt(seg, f)?;
        }
        Ok(())
    }
}

impl FromStr for ConcretePath {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pattern: Pattern = s.parse()?;
        pattern
            .to_concrete()
            .ok_or_else(|| PatternError::WildcardInConcretePath(s.to_owned()))
    }
}

impl From<Vec<Segment>> for ConcretePath {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

/// One position of a [`Pattern`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternSegment {
    /// Must equal the concrete segment (string-coerced)
    Literal(Segment),
    /// Matches any key or index at this depth
    Wildcard,
}

impl PatternSegment {
    /// Check if this position is a wildcard
    #[inline]
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Match a single concrete segment
    #[inline]
    #[must_use]
    pub fn accepts(&self, segment: &Segment) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Literal(lit) => lit.coerced_eq(segment),
        }
    }
}

/// Concrete segments bound to the wildcard positions of a pattern, in order
pub type Captures = SmallVec<[Segment; 4]>;

/// Path with optional wildcard segments
///
/// Patterns match by position and length only; there is no "any depth"
/// wildcard.
///
/// # Examples
/// - `plantings.*.bedsCount` matches `plantings.0.bedsCount`, `plantings.7.bedsCount`
/// - `plantings.*.bedsCount` does NOT match `plantings.0` or `plantings.0.bedsCount.x`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pattern(Vec<PatternSegment>);

impl Pattern {
    /// Create pattern from positions
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<PatternSegment>) -> Self {
        Self(segments)
    }

    /// Root pattern (matches only the empty path)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Pattern positions
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PatternSegment] {
        &self.0
    }

    /// Number of positions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if pattern is the root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of wildcard positions
    #[inline]
    #[must_use]
    pub fn wildcard_count(&self) -> usize {
        self.0.iter().filter(|s| s.is_wildcard()).count()
    }

    /// Check if the last position is a wildcard
    #[inline]
    #[must_use]
    pub fn ends_with_wildcard(&self) -> bool {
        self.0.last().is_some_and(PatternSegment::is_wildcard)
    }

    /// Convert to a concrete path if the pattern has no wildcards
    #[must_use]
    pub fn to_concrete(&self) -> Option<ConcretePath> {
        self.0
            .iter()
            .map(|seg| match seg {
                PatternSegment::Literal(s) => Some(s.clone()),
                PatternSegment::Wildcard => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(ConcretePath)
    }

    /// Check whether `path` is one of the locations this pattern describes
    #[inline]
    #[must_use]
    pub fn matches(&self, path: &ConcretePath) -> bool {
        self.0.len() == path.len() && self.0.iter().zip(path.iter()).all(|(p, s)| p.accepts(s))
    }

    /// Concrete segments found at the wildcard positions, if `path` matches
    #[must_use]
    pub fn captures(&self, path: &ConcretePath) -> Option<Captures> {
        if !self.matches(path) {
            return None;
        }
        Some(
            self.0
                .iter()
                .zip(path.iter())
                .filter(|(p, _)| p.is_wildcard())
                .map(|(_, s)| s.clone())
                .collect(),
        )
    }

    /// Fill the wildcard positions of this pattern positionally from `captures`
    ///
    /// Returns `None` if there are fewer captures than wildcards. Surplus
    /// captures are ignored.
    #[must_use]
    pub fn substitute(&self, captures: &[Segment]) -> Option<ConcretePath> {
        let mut bound = captures.iter();
        self.0
            .iter()
            .map(|seg| match seg {
                PatternSegment::Literal(s) => Some(s.clone()),
                PatternSegment::Wildcard => bound.next().cloned(),
            })
            .collect::<Option<Vec<_>>>()
            .map(ConcretePath)
    }

    /// Map a path matching this pattern onto the corresponding `target` path
    #[inline]
    #[must_use]
    pub fn remap(&self, path: &ConcretePath, target: &Self) -> Option<ConcretePath> {
        self.captures(path).and_then(|caps| target.substitute(&caps))
    }
}

/// Check whether a concrete path matches a pattern
#[inline]
#[must_use]
pub fn matches(path: &ConcretePath, pattern: &Pattern) -> bool {
    pattern.matches(path)
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match seg {
                PatternSegment::Wildcard => f.write_str("*")?,
                PatternSegment::Literal(s) => Display::fmt(s, f)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments = s
            .split('.')
            .map(|seg| match seg {
                "" => Err(PatternError::EmptySegment(s.to_owned())),
                "*" => Ok(PatternSegment::Wildcard),
                _ => Ok(PatternSegment::Literal(parse_segment(seg))),
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl From<&ConcretePath> for Pattern {
    fn from(path: &ConcretePath) -> Self {
        Self(path.iter().cloned().map(PatternSegment::Literal).collect())
    }
}

/// Errors related to path and pattern text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// Empty segment in path text
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// A concrete path was expected
    #[error("path '{0}' contains a wildcard where a concrete path is required")]
    WildcardInConcretePath(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pat(s: &str) -> Pattern {
        s.parse().unwrap()
    }

    fn path(s: &str) -> ConcretePath {
        s.parse().unwrap()
    }

    #[test]
    fn segment_coercion() {
        assert!(Segment::Index(0).coerced_eq(&Segment::key("0")));
        assert!(Segment::key("12").coerced_eq(&Segment::Index(12)));
        assert!(!Segment::key("01").coerced_eq(&Segment::Index(1)));
        assert!(!Segment::key("a").coerced_eq(&Segment::Index(0)));
    }

    #[test]
    fn segment_as_index() {
        assert_eq!(Segment::key("3").as_index(), Some(3));
        assert_eq!(Segment::key("x3").as_index(), None);
        assert_eq!(Segment::key("-1").as_index(), None);
    }

    #[test]
    fn pattern_parse_and_display() {
        let p = pat("a.*.x");
        assert_eq!(p.len(), 3);
        assert_eq!(p.wildcard_count(), 1);
        assert_eq!(p.to_string(), "a.*.x");
        assert_eq!(
            p.segments()[0],
            PatternSegment::Literal(Segment::key("a"))
        );
    }

    #[test]
    fn pattern_parse_digits_as_index() {
        let p = pat("a.0.x");
        assert_eq!(p.segments()[1], PatternSegment::Literal(Segment::Index(0)));
    }

    #[test]
    fn pattern_parse_empty_segment() {
        let result: Result<Pattern, _> = "a..b".parse();
        assert!(matches!(result, Err(PatternError::EmptySegment(_))));
    }

    #[test]
    fn pattern_parse_empty_is_root() {
        assert!(pat("").is_empty());
    }

    #[test]
    fn concrete_path_rejects_wildcard() {
        let result: Result<ConcretePath, _> = "a.*".parse();
        assert!(matches!(result, Err(PatternError::WildcardInConcretePath(_))));
    }

    #[test]
    fn matches_wildcard() {
        assert!(matches(&path("a.0.x"), &pat("a.*.x")));
        assert!(matches(&path("a.foo.x"), &pat("a.*.x")));
        assert!(!matches(&path("a.0.y"), &pat("a.*.x")));
    }

    #[test]
    fn matches_requires_exact_depth() {
        assert!(!matches(&path("a.0"), &pat("a.*.x")));
        assert!(!matches(&path("a.0.x.y"), &pat("a.*.x")));
    }

    #[test]
    fn matches_index_against_key_literal() {
        let concrete = ConcretePath::root().key("a").index(2);
        assert!(matches(&concrete, &pat("a.2")));
        let keyed = ConcretePath::root().key("a").key("2");
        assert!(matches(&keyed, &pat("a.2")));
    }

    #[test]
    fn captures_and_substitute() {
        let from = pat("a.*.b.*");
        let caps = from.captures(&path("a.1.b.k")).unwrap();
        assert_eq!(caps.as_slice(), &[Segment::Index(1), Segment::key("k")]);

        let to = pat("z.*.*");
        assert_eq!(to.substitute(&caps).unwrap(), path("z.1.k"));
    }

    #[test]
    fn substitute_too_few_captures() {
        assert!(pat("a.*.*").substitute(&[Segment::Index(0)]).is_none());
    }

    #[test]
    fn remap_non_matching_is_none() {
        assert!(pat("a.*.x").remap(&path("b.0.x"), &pat("a.*.y")).is_none());
        assert_eq!(
            pat("a.*.x").remap(&path("a.0.x"), &pat("a.*.y")),
            Some(path("a.0.y"))
        );
    }

    #[test]
    fn concrete_path_serde_untagged() {
        let p = ConcretePath::root().key("a").index(0).key("x");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"["a",0,"x"]"#);
        let back: ConcretePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn concrete_path_parent() {
        assert_eq!(path("a.b.c").parent(), Some(path("a.b")));
        assert!(ConcretePath::root().parent().is_none());
    }

    #[test]
    fn concrete_path_starts_with() {
        let leaf = ConcretePath::root().key("p").index(0).key("size");
        assert!(leaf.starts_with(&path("p.0")));
        assert!(leaf.starts_with(&leaf));
        assert!(leaf.starts_with(&ConcretePath::root()));
        assert!(!leaf.starts_with(&path("p.1")));
        assert!(!path("p.0").starts_with(&leaf));
    }

    fn arb_segment() -> impl Strategy<Value = Segment> {
        prop_oneof![
            (0usize..5).prop_map(Segment::Index),
            "[a-c]{1,2}".prop_map(Segment::Key),
        ]
    }

    fn arb_pattern_segment() -> impl Strategy<Value = PatternSegment> {
        prop_oneof![
            Just(PatternSegment::Wildcard),
            arb_segment().prop_map(PatternSegment::Literal),
        ]
    }

    proptest! {
        #[test]
        fn prop_match_iff_same_length_and_literals_equal(
            concrete in prop::collection::vec(arb_segment(), 0..5),
            pattern in prop::collection::vec(arb_pattern_segment(), 0..5),
        ) {
            let expected = concrete.len() == pattern.len()
                && concrete.iter().zip(&pattern).all(|(c, p)| match p {
                    PatternSegment::Wildcard => true,
                    PatternSegment::Literal(l) => l.as_key() == c.as_key(),
                });
            let got = matches(&ConcretePath::new(concrete), &Pattern::new(pattern));
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn prop_concrete_pattern_matches_itself(
            concrete in prop::collection::vec(arb_segment(), 0..5),
        ) {
            let path = ConcretePath::new(concrete);
            prop_assert!(Pattern::from(&path).matches(&path));
        }
    }
}
