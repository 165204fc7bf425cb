//! Property paths
//!
//! A [`PropertyPath`] identifies the location of an item inside a resource
//! tree: the sequence of dict keys / list indices required to reach it from
//! the root. Paths always begin with an implicit empty root segment, so the
//! full-path form of `["contact", "name"]` is `.contact.name`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{TreeError, TreeResult};

/// Separator between path segments in the full-path form.
pub const PATH_SEPARATOR: char = '.';

/// An immutable, hierarchical key sequence addressing one item in a tree.
///
/// ```
/// use restree_core::path::PropertyPath;
///
/// let path = PropertyPath::root().append("contact").append("name");
/// assert_eq!(path.full_path(), ".contact.name");
/// assert_eq!(path.len(), 3); // includes the implicit root segment
/// ```
#[derive(Debug, Clone)]
pub struct PropertyPath {
    segments: Vec<String>,
    // Dot-joined segments, precomputed since ordering and hashing use it.
    full: String,
}

impl PropertyPath {
    /// The root path: just the implicit empty segment.
    pub fn root() -> Self {
        PropertyPath {
            segments: vec![String::new()],
            full: String::new(),
        }
    }

    /// Builds a path from explicit segments (the implicit root segment is
    /// prepended when missing). Fails if any segment contains the separator.
    pub fn new<I, S>(segments: I) -> TreeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = PropertyPath::root();
        for segment in segments {
            path = path.try_append(segment.as_ref())?;
        }
        Ok(path)
    }

    /// Parses the dot-separated full-path form.
    ///
    /// ```
    /// use restree_core::path::PropertyPath;
    ///
    /// let path = PropertyPath::from_full_path(".list.0");
    /// assert_eq!(path.segment(1), Some("list"));
    /// assert_eq!(path.segment(2), Some("0"));
    /// ```
    pub fn from_full_path(full_path: &str) -> Self {
        let mut segments: Vec<String> =
            full_path.split(PATH_SEPARATOR).map(str::to_owned).collect();
        if segments.first().map(String::as_str) != Some("") {
            segments.insert(0, String::new());
        }
        let full = segments.join(".");
        PropertyPath { segments, full }
    }

    /// Returns a new path extended by one segment.
    ///
    /// Panics on segments containing the separator; use [`try_append`] for
    /// caller-supplied input.
    ///
    /// [`try_append`]: PropertyPath::try_append
    pub fn append(&self, segment: &str) -> Self {
        match self.try_append(segment) {
            Ok(path) => path,
            Err(_) => panic!("path segment '{segment}' contains the separator"),
        }
    }

    /// Returns a new path extended by one segment, rejecting segments that
    /// contain the separator character.
    pub fn try_append(&self, segment: &str) -> TreeResult<Self> {
        if segment.contains(PATH_SEPARATOR) {
            return Err(TreeError::InvalidSegment(segment.to_owned()));
        }

        let mut segments = self.segments.clone();
        segments.push(segment.to_owned());
        let mut full = self.full.clone();
        full.push(PATH_SEPARATOR);
        full.push_str(segment);
        Ok(PropertyPath { segments, full })
    }

    /// All segments, including the leading implicit root segment.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Segments below the root, i.e. the keys actually used for descent.
    pub fn key_segments(&self) -> &[String] {
        &self.segments[1..]
    }

    /// Segment at `index`, if present.
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// Number of segments, including the implicit root segment.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the bare root path.
    pub fn is_root(&self) -> bool {
        self.segments.len() == 1
    }

    /// Never empty (the root segment is always present).
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The dot-joined form, e.g. `.contact.name` (empty string for root).
    pub fn full_path(&self) -> &str {
        &self.full
    }

    /// The path one level up, or `None` at the root.
    pub fn parent(&self) -> Option<PropertyPath> {
        if self.is_root() {
            return None;
        }
        let segments = self.segments[..self.segments.len() - 1].to_vec();
        let full = segments.join(".");
        Some(PropertyPath { segments, full })
    }
}

impl PartialEq for PropertyPath {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for PropertyPath {}

impl Hash for PropertyPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full.hash(state);
    }
}

impl PartialOrd for PropertyPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropertyPath {
    /// Shorter full paths sort first, ties break lexicographically.
    ///
    /// Iterating a sorted schema therefore visits ancestors before their
    /// descendants, which is what lets the schema map be built without
    /// override conflicts from ancestor entries.
    fn cmp(&self, other: &Self) -> Ordering {
        self.full
            .len()
            .cmp(&other.full.len())
            .then_with(|| self.full.cmp(&other.full))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<root>{}", self.full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn root_has_implicit_empty_segment() {
        let root = PropertyPath::root();
        assert_eq!(root.len(), 1);
        assert_eq!(root.full_path(), "");
        assert!(root.is_root());
    }

    #[test]
    fn append_extends_full_path() {
        let path = PropertyPath::root().append("object").append("text");
        assert_eq!(path.full_path(), ".object.text");
        assert_eq!(path.key_segments(), ["object", "text"]);
    }

    #[test]
    fn from_full_path_round_trips() {
        let path = PropertyPath::from_full_path(".list.#");
        assert_eq!(path.full_path(), ".list.#");
        assert_eq!(path, PropertyPath::root().append("list").append("#"));
    }

    #[test]
    fn segments_reject_separator() {
        assert!(PropertyPath::root().try_append("a.b").is_err());
        assert!(PropertyPath::new(["ok", "also-ok"]).is_ok());
    }

    #[test]
    fn equality_is_pairwise_segments() {
        let a = PropertyPath::new(["x", "y"]).unwrap();
        let b = PropertyPath::from_full_path(".x.y");
        assert_eq!(a, b);
        assert_ne!(a, PropertyPath::from_full_path(".x"));
    }

    #[test]
    fn ordering_is_length_then_lexicographic() {
        let mut paths = vec![
            PropertyPath::from_full_path(".object.text"),
            PropertyPath::from_full_path(".zz"),
            PropertyPath::from_full_path(".object"),
            PropertyPath::root(),
            PropertyPath::from_full_path(".ab"),
        ];
        paths.sort();
        let order: Vec<&str> = paths.iter().map(|p| p.full_path()).collect();
        // ".zz" and ".ab" have equal length, so they compare lexicographically;
        // ".object" is longer than either despite being an ancestor of the last.
        assert_eq!(order, ["", ".ab", ".zz", ".object", ".object.text"]);
    }

    #[test]
    fn parent_walks_up() {
        let path = PropertyPath::from_full_path(".a.b");
        assert_eq!(path.parent().unwrap().full_path(), ".a");
        assert_eq!(path.parent().unwrap().parent().unwrap(), PropertyPath::root());
        assert!(PropertyPath::root().parent().is_none());
    }

    #[test]
    fn display_marks_the_root() {
        let path = PropertyPath::from_full_path(".name");
        assert_eq!(path.to_string(), "<root>.name");
    }
}
