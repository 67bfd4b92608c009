//! Path normalization helpers shared by the tree walker, alias graph and link rewriter.

use vaultpress_types::ContentPath;

/// Extensions recognised as markdown documents
pub const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "mdx"];

/// Stems that make a file the index document of its directory, in precedence order
pub const INDEX_STEMS: [&str; 2] = ["readme", "_index"];

/// Normalize any raw path into a [`ContentPath`].
///
/// Total and idempotent; see [`ContentPath::new`] for the exact rules.
pub fn normalize(path: &str) -> ContentPath {
    ContentPath::new(path)
}

/// Whether a file name carries a markdown extension (case-insensitive)
pub fn is_markdown_file(name: &str) -> bool {
    markdown_stem(name).is_some()
}

/// File stem when `name` ends in `.md`/`.mdx`
pub fn markdown_stem(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    MARKDOWN_EXTENSIONS
        .iter()
        .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        .then_some(stem)
}

/// Strip a trailing `.md`/`.mdx` extension, leaving other paths untouched
pub fn strip_markdown_ext(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, name)) => match markdown_stem(name) {
            Some(stem) => &path[..dir.len() + 1 + stem.len()],
            None => path,
        },
        None => markdown_stem(path).unwrap_or(path),
    }
}

/// Whether an extension-free segment names a directory index (`readme` or `_index`)
pub fn is_directory_index(segment: &str) -> bool {
    INDEX_STEMS
        .iter()
        .any(|stem| segment.eq_ignore_ascii_case(stem))
}

/// Collapse a trailing `readme`/`_index` segment onto its directory
pub fn collapse_directory_index(path: ContentPath) -> ContentPath {
    match path.file_name() {
        Some(name) if is_directory_index(name) => path.parent(),
        _ => path,
    }
}

/// URL route served for a source file path (relative to the content root)
///
/// ```
/// use vaultpress_core::paths::route_for_source;
/// use vaultpress_types::ContentPath;
///
/// assert_eq!(route_for_source(&ContentPath::new("/guides/setup.md")).as_str(), "/guides/setup");
/// assert_eq!(route_for_source(&ContentPath::new("/guides/README.md")).as_str(), "/guides");
/// assert_eq!(route_for_source(&ContentPath::new("/_index.mdx")).as_str(), "/");
/// ```
pub fn route_for_source(source: &ContentPath) -> ContentPath {
    collapse_directory_index(ContentPath::new(strip_markdown_ext(source.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["", "a", "/a/", "\"/b\"", "a//b/./c/..", "../x"] {
            let once = normalize(raw);
            assert_eq!(normalize(once.as_str()), once);
        }
    }

    #[test]
    fn test_strip_markdown_ext() {
        assert_eq!(strip_markdown_ext("/a/b.md"), "/a/b");
        assert_eq!(strip_markdown_ext("/a/b.MDX"), "/a/b");
        assert_eq!(strip_markdown_ext("b.mdx"), "b");
        assert_eq!(strip_markdown_ext("/a/b.png"), "/a/b.png");
        assert_eq!(strip_markdown_ext("/a.md/b"), "/a.md/b");
        assert_eq!(strip_markdown_ext("/a/.md"), "/a/.md");
    }

    #[test]
    fn test_is_directory_index() {
        assert!(is_directory_index("readme"));
        assert!(is_directory_index("README"));
        assert!(is_directory_index("_index"));
        assert!(!is_directory_index("index"));
    }

    #[test]
    fn test_route_for_source() {
        assert_eq!(route_for_source(&ContentPath::new("/a/b/readme.md")).as_str(), "/a/b");
        assert_eq!(route_for_source(&ContentPath::new("/readme.md")).as_str(), "/");
        assert_eq!(route_for_source(&ContentPath::new("/a/b/c.mdx")).as_str(), "/a/b/c");
    }
}
