//! Path model and segment sanitation
//!
//! Every backend shares one canonical path representation: an ordered
//! sequence of elements, none of which contains the separator. A single
//! trailing separator on an incoming segment is tolerated and normalized
//! away; anything else embedding a separator is rejected.

use crate::error::{Error, Result};

/// Path separator shared by every backend.
pub const SEPARATOR: char = '/';

/// An immutable path inside a storage backend.
///
/// `child`/`parent` return new values; existing references are never
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefPath {
    elements: Vec<String>,
}

impl RefPath {
    /// The root path (no elements).
    pub fn root() -> Self {
        Self { elements: Vec::new() }
    }

    /// Build a path from pre-split elements, sanitizing each one.
    pub fn new<I, S>(elements: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = Self::root();
        for element in elements {
            path = path.child(element.as_ref())?;
        }
        Ok(path)
    }

    /// Parse a separator-joined path string.
    ///
    /// Leading, trailing, and doubled separators are dropped; the result
    /// is the canonical element sequence. Individual elements are not
    /// re-validated since splitting already removed every separator.
    pub fn parse(path: &str) -> Self {
        Self {
            elements: path
                .split(SEPARATOR)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Path elements, in order from the root.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Last element, or the empty string at the root.
    pub fn name(&self) -> &str {
        self.elements.last().map(String::as_str).unwrap_or("")
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of elements.
    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    /// Separator-prefixed, separator-joined absolute form.
    ///
    /// The root renders as a single separator.
    pub fn absolute(&self) -> String {
        if self.elements.is_empty() {
            SEPARATOR.to_string()
        } else {
            let mut s = String::new();
            for element in &self.elements {
                s.push(SEPARATOR);
                s.push_str(element);
            }
            s
        }
    }

    /// Append one sanitized segment.
    ///
    /// - empty or whitespace-only `name` is a no-op and returns a clone;
    /// - a single trailing separator is stripped (`"a/"` behaves as `"a"`);
    /// - any other embedded separator is an [`Error::InvalidPath`].
    pub fn child(&self, name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(self.clone());
        }

        let name = name.strip_suffix(SEPARATOR).unwrap_or(name);
        if name.is_empty() {
            return Ok(self.clone());
        }
        if name.contains(SEPARATOR) {
            return Err(Error::InvalidPath(format!(
                "segment '{name}' must not contain '{SEPARATOR}'"
            )));
        }

        let mut elements = self.elements.clone();
        elements.push(name.to_string());
        Ok(Self { elements })
    }

    /// Drop the last `levels` elements.
    ///
    /// Walking past the root is not an error: the result clamps at the
    /// root. Callers rely on this, so it stays unvalidated.
    pub fn parent(&self, levels: usize) -> Self {
        let keep = self.elements.len().saturating_sub(levels);
        Self {
            elements: self.elements[..keep].to_vec(),
        }
    }
}

impl std::fmt::Display for RefPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.absolute())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root() {
        let root = RefPath::root();
        assert!(root.is_root());
        assert_eq!(root.name(), "");
        assert_eq!(root.absolute(), "/");
    }

    #[test]
    fn test_child_appends() {
        let path = RefPath::root().child("data").unwrap().child("x.txt").unwrap();
        assert_eq!(path.name(), "x.txt");
        assert_eq!(path.absolute(), "/data/x.txt");
        assert_eq!(path.elements(), &["data".to_string(), "x.txt".to_string()]);
    }

    #[test]
    fn test_child_then_parent_round_trips() {
        let base = RefPath::parse("/data/logs");
        let child = base.child("run.csv").unwrap();
        assert_eq!(child.parent(1), base);
    }

    #[test]
    fn test_child_empty_is_noop() {
        let path = RefPath::parse("/data");
        assert_eq!(path.child("").unwrap(), path);
        assert_eq!(path.child("   ").unwrap(), path);
    }

    #[test]
    fn test_child_trailing_separator_stripped() {
        let path = RefPath::root();
        assert_eq!(path.child("a/").unwrap(), path.child("a").unwrap());
        // A bare separator strips down to nothing and is a no-op.
        assert_eq!(path.child("/").unwrap(), path);
    }

    #[test]
    fn test_child_embedded_separator_rejected() {
        let path = RefPath::root();
        assert!(matches!(path.child("a/b"), Err(Error::InvalidPath(_))));
        assert!(matches!(path.child("/a"), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_parent_clamps_at_root() {
        let path = RefPath::parse("/a/b");
        assert_eq!(path.parent(2), RefPath::root());
        assert_eq!(path.parent(5), RefPath::root());
        assert_eq!(RefPath::root().parent(1), RefPath::root());
    }

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(RefPath::parse("/data/x.txt"), RefPath::parse("data/x.txt/"));
        assert_eq!(RefPath::parse("//data//x.txt"), RefPath::parse("/data/x.txt"));
        assert!(RefPath::parse("/").is_root());
        assert!(RefPath::parse("").is_root());
    }

    #[test]
    fn test_new_sanitizes_elements() {
        let path = RefPath::new(["data", "x.txt"]).unwrap();
        assert_eq!(path.absolute(), "/data/x.txt");
        assert!(RefPath::new(["a/b"]).is_err());
        // Trailing separators on individual elements are tolerated.
        assert_eq!(RefPath::new(["a/"]).unwrap().absolute(), "/a");
    }

    #[test]
    fn test_display() {
        assert_eq!(RefPath::parse("/a/b").to_string(), "/a/b");
        assert_eq!(RefPath::root().to_string(), "/");
    }
}
