//! Allowlist HTML sanitizer.
//!
//! Anything outside the allowlist is removed, never escaped. Elements whose
//! content is executable or invisible (`script`, `style`, `template`, ...)
//! are dropped together with their content; other disallowed elements are
//! unwrapped so their text survives. Drops are only logged at trace level.

use super::tree::{HtmlTree, NodeData, NodeId};
use html5ever::ns;

/// Prefix applied to `name` attributes so author content cannot clobber globals
pub const CLOBBER_PREFIX: &str = "user-content-";

const HTML_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "a", "img", "ul", "ol", "li", "blockquote", "hr",
    "em", "strong", "b", "i", "u", "s", "del", "ins", "code", "pre", "br", "div", "span", "mark",
    "kbd", "samp", "var", "sub", "sup", "small", "abbr", "cite", "q", "dl", "dt", "dd", "details",
    "summary", "figure", "figcaption", "section", "picture", "input", "iframe", "video", "audio",
    "source", "track", "table", "thead", "tbody", "tfoot", "tr", "th", "td", "caption", "colgroup",
    "col",
];

const SVG_TAGS: &[&str] = &[
    "svg", "g", "path", "circle", "ellipse", "line", "polyline", "polygon", "rect", "text",
    "tspan", "defs", "linearGradient", "radialGradient", "stop", "clipPath", "mask", "use",
    "title", "desc", "marker", "symbol", "pattern",
];

const MATHML_TAGS: &[&str] = &[
    "math", "mrow", "mi", "mn", "mo", "ms", "mtext", "mfrac", "msqrt", "mroot", "msub", "msup",
    "msubsup", "munder", "mover", "munderover", "mtable", "mtr", "mtd", "mspace", "mstyle",
    "mpadded", "mphantom", "menclose", "semantics", "annotation",
];

/// Elements removed along with everything inside them
const DROP_WITH_CONTENT: &[&str] = &[
    "script", "style", "template", "noscript", "textarea", "select", "object", "embed", "head",
    "title", "xmp", "noembed", "noframes", "foreignObject",
];

const GLOBAL_ATTRS: &[&str] = &[
    "class", "id", "title", "lang", "dir", "role", "name", "aria-label", "aria-hidden",
    "aria-describedby",
];

const URL_ATTRS: &[&str] = &["href", "src", "xlink:href", "cite", "poster"];

const ALLOWED_PROTOCOLS: &[&str] = &["http", "https", "mailto", "tel"];

const SVG_ATTRS: &[&str] = &[
    "viewBox", "width", "height", "xmlns", "fill", "stroke", "stroke-width", "stroke-linecap",
    "stroke-linejoin", "stroke-dasharray", "d", "cx", "cy", "r", "rx", "ry", "x", "y", "x1", "x2",
    "y1", "y2", "dx", "dy", "points", "transform", "opacity", "fill-opacity", "stroke-opacity",
    "fill-rule", "clip-rule", "offset", "stop-color", "stop-opacity", "gradientUnits",
    "gradientTransform", "preserveAspectRatio", "text-anchor", "font-size", "font-family",
    "font-weight", "dominant-baseline", "clip-path", "mask", "href", "xlink:href", "markerWidth",
    "markerHeight", "refX", "refY", "orient", "patternUnits",
];

const MATHML_ATTRS: &[&str] = &[
    "display", "xmlns", "mathvariant", "displaystyle", "scriptlevel", "fence", "stretchy",
    "separator", "lspace", "rspace", "accent", "accentunder", "columnalign", "rowalign",
    "linethickness", "encoding", "width", "height", "depth", "notation",
];

fn html_tag_attrs(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href", "target", "rel"],
        "img" => &["src", "alt", "width", "height", "loading"],
        "th" | "td" => &["align", "scope", "colspan", "rowspan"],
        "ol" => &["start", "type", "reversed"],
        "li" => &["value"],
        "input" => &["type", "checked", "disabled"],
        "iframe" => &[
            "src", "width", "height", "allow", "allowfullscreen", "frameborder", "loading",
            "referrerpolicy",
        ],
        "video" => &[
            "src", "controls", "width", "height", "poster", "autoplay", "loop", "muted",
            "playsinline", "preload",
        ],
        "audio" => &["src", "controls", "loop", "muted", "preload"],
        "source" => &["src", "type"],
        "track" => &["src", "kind", "srclang", "label", "default"],
        "details" => &["open"],
        "blockquote" | "q" => &["cite"],
        "col" | "colgroup" => &["span"],
        _ => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vocabulary {
    Html,
    Svg,
    MathMl,
    Other,
}

/// Counts of what a sanitizing pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeStats {
    pub dropped_elements: usize,
    pub unwrapped_elements: usize,
    pub dropped_attributes: usize,
}

/// Sanitize every descendant of `root` in place
pub fn sanitize(tree: &mut HtmlTree, root: NodeId) -> SanitizeStats {
    let mut stats = SanitizeStats::default();
    sanitize_children(tree, root, &mut stats);
    stats
}

fn sanitize_children(tree: &mut HtmlTree, parent: NodeId, stats: &mut SanitizeStats) {
    let children = tree.children(parent).to_vec();
    for child in children {
        match tree.node(child).data {
            NodeData::Text(_) => {}
            NodeData::Element { .. } => sanitize_element(tree, child, stats),
            NodeData::Comment(_) | NodeData::Doctype | NodeData::Document => tree.detach(child),
        }
    }
}

fn vocabulary(tree: &HtmlTree, id: NodeId) -> Vocabulary {
    match tree.namespace(id) {
        Some(namespace) if *namespace == ns!(html) => Vocabulary::Html,
        Some(namespace) if *namespace == ns!(svg) => Vocabulary::Svg,
        Some(namespace) if *namespace == ns!(mathml) => Vocabulary::MathMl,
        _ => Vocabulary::Other,
    }
}

fn is_allowed_element(tree: &HtmlTree, id: NodeId, vocab: Vocabulary, tag: &str) -> bool {
    let listed = match vocab {
        Vocabulary::Html => HTML_TAGS.contains(&tag),
        Vocabulary::Svg => SVG_TAGS.contains(&tag),
        Vocabulary::MathMl => MATHML_TAGS.contains(&tag),
        Vocabulary::Other => false,
    };
    // Only task-list checkboxes are allowed as form controls.
    if listed && tag == "input" {
        return tree
            .attr(id, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"));
    }
    listed
}

fn sanitize_element(tree: &mut HtmlTree, id: NodeId, stats: &mut SanitizeStats) {
    let Some(tag) = tree.tag(id).map(str::to_string) else {
        return;
    };
    let vocab = vocabulary(tree, id);

    if !is_allowed_element(tree, id, vocab, &tag) {
        if DROP_WITH_CONTENT.contains(&tag.as_str()) || tag == "input" {
            tracing::trace!("sanitizer dropped <{}> with its content", tag);
            tree.detach(id);
            stats.dropped_elements += 1;
        } else {
            tracing::trace!("sanitizer unwrapped <{}>", tag);
            sanitize_children(tree, id, stats);
            tree.unwrap(id);
            stats.unwrapped_elements += 1;
        }
        return;
    }

    sanitize_attributes(tree, id, vocab, &tag, stats);
    sanitize_children(tree, id, stats);
}

fn is_allowed_attr(vocab: Vocabulary, tag: &str, attr: &str) -> bool {
    if GLOBAL_ATTRS.contains(&attr) {
        return true;
    }
    match vocab {
        Vocabulary::Html => html_tag_attrs(tag).contains(&attr),
        Vocabulary::Svg => SVG_ATTRS.contains(&attr),
        Vocabulary::MathMl => MATHML_ATTRS.contains(&attr),
        Vocabulary::Other => false,
    }
}

fn sanitize_attributes(
    tree: &mut HtmlTree,
    id: NodeId,
    vocab: Vocabulary,
    tag: &str,
    stats: &mut SanitizeStats,
) {
    let Some(attrs) = tree.attrs_mut(id) else {
        return;
    };
    let before = attrs.len();
    attrs.retain(|attr| {
        let keep = is_allowed_attr(vocab, tag, &attr.name)
            && (!URL_ATTRS.contains(&attr.name.as_str()) || is_safe_url(&attr.value));
        if !keep {
            tracing::trace!("sanitizer dropped {}=\"{}\" on <{}>", attr.name, attr.value, tag);
        }
        keep
    });
    stats.dropped_attributes += before - attrs.len();

    for attr in attrs.iter_mut() {
        if attr.name == "name" && !attr.value.starts_with(CLOBBER_PREFIX) {
            attr.value = format!("{CLOBBER_PREFIX}{}", attr.value);
        }
    }
}

/// Whether a URL uses an allowed protocol (or none, i.e. is relative)
pub fn is_safe_url(url: &str) -> bool {
    // Browsers ignore embedded whitespace and control characters in schemes.
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    let scheme_end = compact.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(idx) if compact[idx..].starts_with(':') => {
            let scheme = compact[..idx].to_ascii_lowercase();
            ALLOWED_PROTOCOLS.contains(&scheme.as_str())
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::serialize::serialize_children;
    use crate::html::sink::parse_fragment;

    fn clean(html: &str) -> String {
        let (mut tree, body) = parse_fragment(html);
        sanitize(&mut tree, body);
        serialize_children(&tree, body)
    }

    #[test]
    fn test_script_is_removed_with_content() {
        let out = clean("<p>hi</p><script>alert(1)</script><SCRIPT src=x></SCRIPT>");
        assert!(!out.to_lowercase().contains("<script"));
        assert!(!out.contains("alert"));
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn test_unknown_elements_are_unwrapped() {
        assert_eq!(clean("<custom-box><b>kept</b></custom-box>"), "<b>kept</b>");
        assert_eq!(clean("<font color=red>text</font>"), "text");
    }

    #[test]
    fn test_event_handlers_and_styles_are_dropped() {
        let out = clean(r#"<div onclick="x()" style="color:red" class="note">a</div>"#);
        assert_eq!(out, r#"<div class="note">a</div>"#);
    }

    #[test]
    fn test_dangerous_protocols() {
        assert_eq!(clean(r#"<a href="javascript:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(clean(r#"<a href="java&#9;script:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(clean(r#"<img src="data:image/png;base64,AAAA">"#), "<img>");
        assert_eq!(
            clean(r#"<a href="https://example.com/a:b">x</a>"#),
            r#"<a href="https://example.com/a:b">x</a>"#
        );
        assert_eq!(clean(r#"<a href="../rel">x</a>"#), r#"<a href="../rel">x</a>"#);
    }

    #[test]
    fn test_name_is_clobber_prefixed_but_id_is_not() {
        let out = clean(r#"<h2 id="setup" name="setup">Setup</h2>"#);
        assert_eq!(out, r#"<h2 id="setup" name="user-content-setup">Setup</h2>"#);
    }

    #[test]
    fn test_embeds_survive() {
        let out = clean(
            r#"<iframe src="https://www.youtube.com/embed/x" allowfullscreen="" onload="x"></iframe><video controls="" src="/v.mp4"></video>"#,
        );
        assert!(out.contains(r#"<iframe src="https://www.youtube.com/embed/x" allowfullscreen="">"#));
        assert!(out.contains(r#"<video controls="" src="/v.mp4">"#));
        assert!(!out.contains("onload"));
    }

    #[test]
    fn test_svg_subset() {
        let out = clean(
            r#"<svg viewBox="0 0 4 4" onload="x"><path d="M0 0L4 4"></path><foreignObject><p>no</p></foreignObject></svg>"#,
        );
        assert_eq!(out, r#"<svg viewBox="0 0 4 4"><path d="M0 0L4 4"></path></svg>"#);
    }

    #[test]
    fn test_mathml_subset() {
        let out = clean(r#"<math display="block"><mi>x</mi><maction>y</maction></math>"#);
        assert_eq!(out, r#"<math display="block"><mi>x</mi>y</math>"#);
    }

    #[test]
    fn test_only_checkbox_inputs() {
        assert_eq!(
            clean(r#"<input type="checkbox" checked="" disabled="">"#),
            r#"<input type="checkbox" checked="" disabled="">"#
        );
        assert_eq!(clean(r#"<input type="text" value="x">"#), "");
    }

    #[test]
    fn test_comments_are_removed() {
        assert_eq!(clean("<p>a<!-- secret -->b</p>"), "<p>ab</p>");
    }

    #[test]
    fn test_stats() {
        let (mut tree, body) = parse_fragment(r#"<script></script><font>x</font><b onclick="y">z</b>"#);
        let stats = sanitize(&mut tree, body);
        assert_eq!(
            stats,
            SanitizeStats {
                dropped_elements: 1,
                unwrapped_elements: 1,
                dropped_attributes: 1,
            }
        );
    }
}
