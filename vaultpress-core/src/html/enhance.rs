//! Structural post-processing of the rendered tree.

use super::tree::{HtmlTree, NodeId};
use crate::markdown::headings::{HeadingSlugRegistry, TOC_DEPTHS};

fn heading_depth(tag: &str) -> Option<u8> {
    let depth = tag.strip_prefix('h')?.parse::<u8>().ok()?;
    TOC_DEPTHS.contains(&depth).then_some(depth)
}

/// Stage 9: `<code>` outside `<pre>` and outside math becomes `<mark class="inline-code">`
pub fn reclassify_inline_code(tree: &mut HtmlTree, root: NodeId) {
    for code in tree.elements_named(root, "code") {
        let in_math = tree
            .ancestor_where(code, |n| tree.has_class(n, "math"))
            .is_some();
        if tree.has_ancestor(code, "pre") || in_math {
            continue;
        }
        tree.rename(code, "mark");
        tree.remove_attr(code, "class");
        tree.add_class(code, "inline-code");
    }
}

/// Stage 11: heading anchors, link and list classes, block wrappers
pub fn enhance(tree: &mut HtmlTree, root: NodeId, registry: &HeadingSlugRegistry) {
    assign_heading_ids(tree, root, registry);
    mark_internal_links(tree, root);
    classify_lists(tree, root);
    wrap_blocks(tree, root, "pre", "code-block");
    wrap_blocks(tree, root, "table", "table-wrapper");
}

/// Anchors on h2–h5. Markdown headings already carry their ids; headings
/// from raw HTML get one from the registry after every existing id is taken.
fn assign_heading_ids(tree: &mut HtmlTree, root: NodeId, registry: &HeadingSlugRegistry) {
    let mut ids = registry.ids();
    let headings: Vec<NodeId> = tree
        .descendants(root)
        .into_iter()
        .filter(|&n| tree.tag(n).and_then(heading_depth).is_some())
        .collect();

    for &heading in &headings {
        if let Some(existing) = tree.attr(heading, "id").filter(|id| !id.is_empty()) {
            ids.reserve(existing);
        }
    }

    for heading in headings {
        let id = match tree.attr(heading, "id").filter(|id| !id.is_empty()) {
            Some(existing) => existing.to_string(),
            None => {
                let text = tree.text_content(heading);
                let id = ids.assign(text.trim());
                tree.set_attr(heading, "id", id.clone());
                id
            }
        };

        let href = format!("#{id}");
        let wrapper = tree.create_html_element("span", &[("class", "heading-wrapper")]);
        tree.reparent_children(heading, wrapper);
        let anchor = tree.create_html_element(
            "a",
            &[
                ("class", "heading-anchor"),
                ("href", href.as_str()),
                ("aria-label", "Copy link to heading"),
            ],
        );
        tree.append_text(anchor, "#");
        tree.append(wrapper, anchor);
        tree.append(heading, wrapper);
    }
}

fn mark_internal_links(tree: &mut HtmlTree, root: NodeId) {
    for anchor in tree.elements_named(root, "a") {
        let internal = tree
            .attr(anchor, "href")
            .is_some_and(|href| href.starts_with('/') && !href.starts_with("//"));
        if internal {
            tree.add_class(anchor, "internal-link");
        }
    }
}

fn classify_lists(tree: &mut HtmlTree, root: NodeId) {
    for list in tree.elements_named(root, "ul") {
        tree.add_class(list, "list-disc");
    }
    for list in tree.elements_named(root, "ol") {
        tree.add_class(list, "list-decimal");
    }
    for item in tree.elements_named(root, "li") {
        tree.add_class(item, "list-item");
        let has_checkbox = tree
            .children(item)
            .iter()
            .any(|&c| tree.is_element(c, "input") && tree.attr(c, "type") == Some("checkbox"));
        if has_checkbox {
            tree.add_class(item, "task-list-item");
        }
    }
}

fn wrap_blocks(tree: &mut HtmlTree, root: NodeId, tag: &str, class: &str) {
    for block in tree.elements_named(root, tag) {
        let wrapped = tree
            .parent(block)
            .is_some_and(|p| tree.is_element(p, "div") && tree.has_class(p, class));
        if wrapped {
            continue;
        }
        let wrapper = tree.create_html_element("div", &[("class", class)]);
        tree.wrap(block, wrapper);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::serialize::serialize_children;
    use crate::html::sink::parse_fragment;

    fn enhance_html(html: &str, headings: &[&str]) -> String {
        let (mut tree, body) = parse_fragment(html);
        let mut registry = HeadingSlugRegistry::new();
        for heading in headings {
            registry.observe(heading);
        }
        reclassify_inline_code(&mut tree, body);
        enhance(&mut tree, body, &registry);
        serialize_children(&tree, body)
    }

    #[test]
    fn test_heading_anchor_markup() {
        let out = enhance_html("<h2>Step One</h2>", &["Step One"]);
        assert_eq!(
            out,
            "<h2 id=\"step-one\"><span class=\"heading-wrapper\">Step One<a class=\"heading-anchor\" \
             href=\"#step-one\" aria-label=\"Copy link to heading\">#</a></span></h2>"
        );
    }

    #[test]
    fn test_repeated_headings_and_h1_h6_skipped() {
        let out = enhance_html(
            "<h1>Intro</h1><h2>Intro</h2><h3>Intro</h3><h6>Intro</h6>",
            &["Intro", "Intro"],
        );
        assert!(out.starts_with("<h1>Intro</h1>"));
        assert!(out.contains("<h2 id=\"intro\">"));
        assert!(out.contains("<h3 id=\"intro-2\">"));
        assert!(out.ends_with("<h6>Intro</h6>"));
    }

    #[test]
    fn test_explicit_heading_id_kept() {
        let out = enhance_html("<h2 id=\"custom\">Setup</h2>", &["Setup"]);
        assert!(out.contains("<h2 id=\"custom\">"));
        assert!(out.contains("href=\"#custom\""));
    }

    #[test]
    fn test_existing_ids_reserved_before_raw_headings() {
        let out = enhance_html("<h2>Intro</h2><h2 id=\"intro\">Intro</h2>", &["Intro"]);
        assert!(out.starts_with("<h2 id=\"intro-2\">"));
        assert_eq!(out.matches("id=\"intro\"").count(), 1);
    }

    #[test]
    fn test_inline_code_reclassified() {
        let out = enhance_html(
            "<p><code class=\"x\">a</code></p><pre><code class=\"language-rs\">b</code></pre>",
            &[],
        );
        assert!(out.contains("<mark class=\"inline-code\">a</mark>"));
        assert!(out.contains("<div class=\"code-block\"><pre><code class=\"language-rs\">b</code></pre></div>"));
    }

    #[test]
    fn test_links_lists_and_tables() {
        let out = enhance_html(
            "<p><a href=\"/guides\">g</a><a href=\"//cdn\">c</a><a href=\"https://x\">x</a></p>\
             <ul><li><input type=\"checkbox\">done</li></ul><ol><li>one</li></ol>\
             <table><tr><td>1</td></tr></table>",
            &[],
        );
        assert!(out.contains("<a href=\"/guides\" class=\"internal-link\">"));
        assert!(out.contains("<a href=\"//cdn\">"));
        assert!(out.contains("<ul class=\"list-disc\"><li class=\"list-item task-list-item\">"));
        assert!(out.contains("<ol class=\"list-decimal\"><li class=\"list-item\">"));
        assert!(out.contains("<div class=\"table-wrapper\"><table>"));
    }
}
