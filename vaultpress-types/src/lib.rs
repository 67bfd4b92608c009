//! Shared types for vaultpress
//!
//! This crate provides the value types passed between the content graph,
//! the markdown pipeline and the CLI: normalized content paths and table of
//! contents entries.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A normalized, slash-prefixed path identifying a document or directory
/// relative to the content root.
///
/// Construction always normalizes, so two `ContentPath`s compare equal
/// exactly when they address the same location:
///
/// - a single leading slash, no trailing slash (the root is `/`)
/// - no empty, `.` or `..` segments (`..` never climbs above the root)
/// - stray `"` characters removed
///
/// ```
/// use vaultpress_types::ContentPath;
///
/// assert_eq!(ContentPath::new("guides/setup/").as_str(), "/guides/setup");
/// assert_eq!(ContentPath::new("\"/a//b/../c\"").as_str(), "/a/c");
/// assert_eq!(ContentPath::new("").as_str(), "/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ContentPath(String);

impl ContentPath {
    /// Normalize a raw path or URL path into a `ContentPath`. Never fails.
    pub fn new(raw: &str) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        let cleaned = raw.replace('"', "");
        for segment in cleaned.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        Self::from_segments(segments)
    }

    /// The content root, `/`.
    pub fn root() -> Self {
        Self(String::from("/"))
    }

    /// Build a path from already-clean segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() {
                continue;
            }
            path.push('/');
            path.push_str(segment);
        }
        if path.is_empty() {
            Self::root()
        } else {
            Self(path)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path segments, excluding the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment, `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Parent directory. The root is its own parent.
    pub fn parent(&self) -> ContentPath {
        match self.0.rfind('/') {
            Some(0) | None => Self::root(),
            Some(idx) => Self(self.0[..idx].to_string()),
        }
    }

    /// Resolve `relative` against this path, treating `self` as a directory.
    ///
    /// A `relative` starting with `/` replaces the base entirely.
    pub fn join(&self, relative: &str) -> ContentPath {
        if relative.starts_with('/') {
            Self::new(relative)
        } else {
            Self::new(&format!("{}/{}", self.0, relative))
        }
    }

    /// Segment-wise prefix test (`/a/bc` does not start with `/a/b`).
    pub fn starts_with(&self, prefix: &ContentPath) -> bool {
        if prefix.is_root() {
            return true;
        }
        self.0 == prefix.0
            || (self.0.starts_with(&prefix.0) && self.0[prefix.0.len()..].starts_with('/'))
    }

    /// Remainder of this path below `prefix`, as a rooted path.
    pub fn strip_prefix(&self, prefix: &ContentPath) -> Option<ContentPath> {
        if !self.starts_with(prefix) {
            return None;
        }
        if prefix.is_root() {
            return Some(self.clone());
        }
        Some(Self::new(&self.0[prefix.0.len()..]))
    }

    /// Path without the leading slash (`""` for the root).
    pub fn relative(&self) -> &str {
        &self.0[1..]
    }
}

impl Default for ContentPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContentPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ContentPath {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<ContentPath> for String {
    fn from(path: ContentPath) -> Self {
        path.0
    }
}

/// A heading entry in a document's table of contents.
///
/// Only headings of depth 2 through 5 appear; deeper headings nest under
/// the nearest shallower one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocItem {
    /// Anchor id, unique within the document
    pub id: String,
    /// Heading text
    pub value: String,
    pub depth: u8,
    #[serde(default)]
    pub children: Vec<TocItem>,
}

impl TocItem {
    pub fn new(id: impl Into<String>, value: impl Into<String>, depth: u8) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            depth,
            children: Vec::new(),
        }
    }

    /// Iterate this item and all descendants in document order.
    pub fn flatten(&self) -> Vec<&TocItem> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }
}
