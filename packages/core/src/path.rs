//! Slash-delimited document paths.
//!
//! Paths are never rejected syntactically. Whether a path points at anything
//! is decided by the resolver at lookup time, not here.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Characters trimmed from the end of a raw path: separators, the current
/// node marker and wildcards.
const TRAILING_TRIM: &[char] = &['.', '/', '*', ' '];
const LEADING_TRIM: &[char] = &[' ', '/'];

/// One component of a path.
///
/// A segment made only of ASCII digits addresses an array index; any other
/// segment is an object key.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Segment(String);

impl Segment {
    pub fn new(s: impl Into<String>) -> Self {
        Segment(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_index(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    /// The array index this segment addresses, if it is all digits.
    pub fn as_index(&self) -> Option<usize> {
        if self.is_index() {
            self.0.parse().ok()
        } else {
            None
        }
    }

    /// Position alias carried by this segment (`first`, `last`, `-1`, digits).
    pub fn as_position(&self) -> Option<Position> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment(s.to_string())
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Segment(s)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment(i.to_string())
    }
}

/// A normalized document path.
///
/// The empty path addresses the whole document.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Path::default()
    }

    /// Parse a `/`-delimited path.
    ///
    /// Leading separators and trailing separators, `.` and `*` markers are
    /// trimmed; empty components are dropped.
    ///
    /// ```rust
    /// use jsonkit_core::Path;
    ///
    /// let path = Path::parse("/store/book/0/");
    /// assert_eq!(path.len(), 3);
    /// assert_eq!(Path::parse("/store/*"), Path::parse("store"));
    /// assert!(Path::parse("/").is_root());
    /// ```
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw
            .trim_end_matches(TRAILING_TRIM)
            .trim_start_matches(LEADING_TRIM);
        Path {
            segments: trimmed
                .split('/')
                .filter(|s| !s.is_empty())
                .map(Segment::from)
                .collect(),
        }
    }

    /// Parse a path whose caller uses `.` as separator.
    pub fn parse_dotted(raw: &str) -> Self {
        Path {
            segments: raw
                .split('.')
                .map(|s| s.trim_matches(LEADING_TRIM))
                .filter(|s| !s.is_empty())
                .map(Segment::from)
                .collect(),
        }
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Path { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Split into the parent path and the final segment.
    ///
    /// The root path splits into `(root, None)`: the key is "the whole
    /// document".
    pub fn split_last(&self) -> (Path, Option<Segment>) {
        match self.segments.split_last() {
            Some((key, parent)) => (
                Path {
                    segments: parent.to_vec(),
                },
                Some(key.clone()),
            ),
            None => (Path::root(), None),
        }
    }

    /// This path with one more segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<Segment>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Path { segments }
    }

    /// Join this path with another.
    #[must_use]
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Path { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        Path::parse(raw)
    }
}

impl From<String> for Path {
    fn from(raw: String) -> Self {
        Path::parse(&raw)
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Self {
        path.clone()
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Segment;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

/// Position of an array edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    First,
    Last,
    Index(usize),
}

impl FromStr for Position {
    type Err = Error;

    /// Accepts `first`, `last`, `-1` and non-negative integers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "0" => Ok(Position::First),
            "last" | "-1" => Ok(Position::Last),
            other => other
                .parse::<usize>()
                .map(Position::Index)
                .map_err(|_| Error::InvalidArgument {
                    message: format!("'{}' is not an array position", s),
                }),
        }
    }
}

impl From<usize> for Position {
    fn from(i: usize) -> Self {
        if i == 0 {
            Position::First
        } else {
            Position::Index(i)
        }
    }
}

/// Builds a path one component at a time.
///
/// ```rust
/// use jsonkit_core::{Path, PathBuilder};
///
/// let path = PathBuilder::new().segment("store").segment("book").index(0).resolve();
/// assert_eq!(path, Path::parse("/store/book/0"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    segments: Vec<Segment>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn segment(mut self, name: impl Into<String>) -> Self {
        self.segments.push(Segment::new(name));
        self
    }

    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(Segment::from(index));
        self
    }

    pub fn resolve(self) -> Path {
        Path {
            segments: self.segments,
        }
    }
}

/// Macro for writing path literals.
///
/// ```rust
/// use jsonkit_core::path;
///
/// let p = path!("/users/123/name");
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_paths() {
        assert_eq!(Path::parse("").len(), 0);
        assert_eq!(Path::parse("/foo").len(), 1);
        assert_eq!(Path::parse("foo/bar").len(), 2);
        assert_eq!(Path::parse("/foo/bar/baz").len(), 3);
    }

    #[test]
    fn normalize_markers() {
        assert_eq!(Path::parse("/foo/bar/"), Path::parse("foo/bar"));
        assert_eq!(Path::parse("foo//bar"), Path::parse("foo/bar"));
        assert_eq!(Path::parse(" /foo/bar/* "), Path::parse("foo/bar"));
        assert_eq!(Path::parse("/foo/."), Path::parse("foo"));
        assert!(Path::parse(".").is_root());
        assert!(Path::parse("/*").is_root());
    }

    #[test]
    fn dotted_paths() {
        assert_eq!(Path::parse_dotted("store.book.0"), path!("/store/book/0"));
        assert!(Path::parse_dotted("").is_root());
    }

    #[test]
    fn numeric_segments_are_indices() {
        let p = path!("items/10/name");
        assert_eq!(p[1].as_index(), Some(10));
        assert_eq!(p[2].as_index(), None);
        assert!(!Segment::from("-1").is_index());
        assert!(!Segment::from("1a").is_index());
    }

    #[test]
    fn split_last_yields_parent_and_key() {
        let (parent, key) = path!("/store/book/title").split_last();
        assert_eq!(parent, path!("/store/book"));
        assert_eq!(key, Some(Segment::from("title")));

        let (parent, key) = path!("/store").split_last();
        assert!(parent.is_root());
        assert_eq!(key, Some(Segment::from("store")));

        let (parent, key) = path!("/").split_last();
        assert!(parent.is_root());
        assert_eq!(key, None);
    }

    #[test]
    fn display_uses_leading_slash() {
        assert_eq!(path!("a/b").to_string(), "/a/b");
        assert_eq!(Path::root().to_string(), "/");
    }

    #[test]
    fn join_appends_segments() {
        assert_eq!(path!("a").join(&path!("b/c")), path!("a/b/c"));
        assert_eq!(Path::root().join(&path!("b")), path!("b"));
    }

    #[test]
    fn position_aliases() {
        assert_eq!("first".parse::<Position>().unwrap(), Position::First);
        assert_eq!("0".parse::<Position>().unwrap(), Position::First);
        assert_eq!("LAST".parse::<Position>().unwrap(), Position::Last);
        assert_eq!("-1".parse::<Position>().unwrap(), Position::Last);
        assert_eq!("3".parse::<Position>().unwrap(), Position::Index(3));
        assert!("middle".parse::<Position>().is_err());
        assert!("-2".parse::<Position>().is_err());
    }

    #[test]
    fn builder_accumulates_segments() {
        let path = PathBuilder::new()
            .segment("store")
            .segment("book")
            .index(2)
            .segment("title")
            .resolve();
        assert_eq!(path.to_string(), "/store/book/2/title");
        assert!(PathBuilder::new().resolve().is_root());
    }
}
