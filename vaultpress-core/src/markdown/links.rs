//! Link and image rewriting to absolute, extension-free, alias-aware site paths.

use crate::alias::AliasGraph;
use crate::paths::{collapse_directory_index, strip_markdown_ext};
use pulldown_cmark::{CowStr, Event, Tag};
use regex::Regex;
use std::sync::OnceLock;
use vaultpress_types::ContentPath;

static SCHEME_REGEX: OnceLock<Regex> = OnceLock::new();

fn scheme_regex() -> &'static Regex {
    SCHEME_REGEX.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").unwrap())
}

/// Links that are never rewritten: any scheme, protocol-relative, in-page anchors
fn passes_through(link: &str) -> bool {
    link.is_empty() || link.starts_with('#') || link.starts_with("//") || scheme_regex().is_match(link)
}

/// Split `path?query#fragment` into the path and the untouched suffix
fn split_suffix(link: &str) -> (&str, &str) {
    match link.find(['?', '#']) {
        Some(idx) => link.split_at(idx),
        None => (link, ""),
    }
}

/// Resolve a local reference against the directory of `document`
fn resolve(path: &str, document: &ContentPath) -> ContentPath {
    if path.starts_with('/') {
        ContentPath::new(path)
    } else {
        document.parent().join(path)
    }
}

/// Rewrite one link found in `document` (a source path such as `/a/b/doc.md`).
///
/// ```
/// use vaultpress_core::alias::AliasGraph;
/// use vaultpress_core::markdown::links::rewrite_link;
/// use vaultpress_types::ContentPath;
///
/// let doc = ContentPath::new("/a/b/doc.md");
/// let aliases = AliasGraph::empty();
/// assert_eq!(rewrite_link("../sibling.md", &doc, &aliases), "/a/sibling");
/// assert_eq!(rewrite_link("/a/b/readme", &doc, &aliases), "/a/b");
/// assert_eq!(rewrite_link("https://x.dev/a.md", &doc, &aliases), "https://x.dev/a.md");
/// ```
pub fn rewrite_link(link: &str, document: &ContentPath, aliases: &AliasGraph) -> String {
    if passes_through(link) {
        return link.to_string();
    }
    let (path, suffix) = split_suffix(link);
    if path.is_empty() {
        return link.to_string();
    }

    let resolved = collapse_directory_index(resolve(strip_markdown_ext(path), document));
    let canonical = aliases.key_for_target(&resolved).unwrap_or(&resolved);
    format!("{}{}", canonical, suffix)
}

/// Rewrite an image source: relative paths are rooted under `asset_prefix`,
/// extensions are kept and aliases never apply.
pub fn rewrite_image(src: &str, document: &ContentPath, asset_prefix: &str) -> String {
    if passes_through(src) || src.starts_with('/') {
        return src.to_string();
    }
    let (path, suffix) = split_suffix(src);
    if path.is_empty() {
        return src.to_string();
    }

    let resolved = resolve(path, document);
    let prefix = ContentPath::new(asset_prefix);
    if prefix.is_root() {
        format!("{}{}", resolved, suffix)
    } else {
        format!("{}{}{}", prefix, resolved, suffix)
    }
}

/// Stage 5: rewrite every link and image in the event stream
pub struct LinkRewriter<'a> {
    document: &'a ContentPath,
    aliases: &'a AliasGraph,
    asset_prefix: &'a str,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(document: &'a ContentPath, aliases: &'a AliasGraph, asset_prefix: &'a str) -> Self {
        Self {
            document,
            aliases,
            asset_prefix,
        }
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        events
            .into_iter()
            .map(|event| match event {
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    let rewritten = rewrite_link(&dest_url, self.document, self.aliases);
                    Event::Start(Tag::Link {
                        link_type,
                        dest_url: CowStr::from(rewritten),
                        title,
                        id,
                    })
                }
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    let rewritten = rewrite_image(&dest_url, self.document, self.asset_prefix);
                    Event::Start(Tag::Image {
                        link_type,
                        dest_url: CowStr::from(rewritten),
                        title,
                        id,
                    })
                }
                other => other,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str) -> ContentPath {
        ContentPath::new(path)
    }

    #[test]
    fn test_external_and_anchor_links_pass_through() {
        let aliases = AliasGraph::empty();
        let d = doc("/a/doc.md");
        for link in [
            "https://example.com/x.md",
            "http://example.com",
            "mailto:me@example.com",
            "tel:+123",
            "#section",
            "//cdn.example.com/x",
            "ftp://host/file",
        ] {
            assert_eq!(rewrite_link(link, &d, &aliases), link);
        }
    }

    #[test]
    fn test_relative_resolution() {
        let aliases = AliasGraph::empty();
        let d = doc("/guides/setup.md");
        assert_eq!(rewrite_link("./other.md", &d, &aliases), "/guides/other");
        assert_eq!(rewrite_link("other.MDX", &d, &aliases), "/guides/other");
        assert_eq!(rewrite_link("../readme.md", &d, &aliases), "/");
        assert_eq!(rewrite_link("sub/_index.md", &d, &aliases), "/guides/sub");
        assert_eq!(rewrite_link("../../../escape.md", &d, &aliases), "/escape");
    }

    #[test]
    fn test_query_and_fragment_are_preserved() {
        let aliases = AliasGraph::empty();
        let d = doc("/guides/setup.md");
        assert_eq!(rewrite_link("other.md#install", &d, &aliases), "/guides/other#install");
        assert_eq!(rewrite_link("/x/y.md?v=2#top", &d, &aliases), "/x/y?v=2#top");
    }

    #[test]
    fn test_reverse_alias_substitution() {
        let aliases = AliasGraph::from_expanded(
            [
                (doc("brainery"), doc("handbook")),
                (doc("brainery/setup"), doc("handbook/setup")),
            ]
            .into_iter()
            .collect(),
        );
        let d = doc("/handbook/readme.md");
        assert_eq!(rewrite_link("setup.md", &d, &aliases), "/brainery/setup");
        assert_eq!(rewrite_link("/handbook/README.md", &d, &aliases), "/brainery");
        assert_eq!(rewrite_link("/elsewhere.md", &d, &aliases), "/elsewhere");
    }

    #[test]
    fn test_image_rewriting() {
        let d = doc("/guides/setup.md");
        assert_eq!(
            rewrite_image("./img/diagram.png", &d, "/content"),
            "/content/guides/img/diagram.png"
        );
        assert_eq!(rewrite_image("../shared/a.webp?w=2", &d, "/content/"), "/content/shared/a.webp?w=2");
        assert_eq!(rewrite_image("/static/logo.svg", &d, "/content"), "/static/logo.svg");
        assert_eq!(rewrite_image("https://x.dev/a.png", &d, "/content"), "https://x.dev/a.png");
        assert_eq!(rewrite_image("pic.md", &d, "/"), "/guides/pic.md");
    }

    #[test]
    fn test_rewriter_touches_links_and_images() {
        let aliases = AliasGraph::empty();
        let d = doc("/guides/setup.md");
        let rewriter = LinkRewriter::new(&d, &aliases, "/content");
        let events: Vec<Event<'static>> =
            pulldown_cmark::Parser::new("See [other](./other.md) ![x](a.png)")
                .map(Event::into_static)
                .collect();
        let out = rewriter.transform(events);
        let dests: Vec<String> = out
            .iter()
            .filter_map(|e| match e {
                Event::Start(Tag::Link { dest_url, .. }) | Event::Start(Tag::Image { dest_url, .. }) => {
                    Some(dest_url.to_string())
                }
                _ => None,
            })
            .collect();
        assert_eq!(dests, vec!["/guides/other", "/content/guides/a.png"]);
    }
}
