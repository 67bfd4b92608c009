//! HTML serialization for [`HtmlTree`] fragments.

use super::tree::{HtmlTree, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize the children of `root` (not `root` itself)
pub fn serialize_children(tree: &HtmlTree, root: NodeId) -> String {
    let mut out = String::new();
    for child in tree.children(root) {
        write_node(tree, *child, &mut out);
    }
    out
}

fn write_node(tree: &HtmlTree, id: NodeId, out: &mut String) {
    match &tree.node(id).data {
        NodeData::Document => {
            for child in tree.children(id) {
                write_node(tree, *child, out);
            }
        }
        NodeData::Doctype => out.push_str("<!DOCTYPE html>"),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Text(text) => {
            let raw = tree
                .parent(id)
                .and_then(|p| tree.tag(p))
                .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
            if raw {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeData::Element { name, attrs } => {
            let tag: &str = &name.local;
            out.push('<');
            out.push_str(tag);
            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_attr(&attr.value, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag) {
                return;
            }
            for child in tree.children(id) {
                write_node(tree, *child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

/// Escape text for inclusion in HTML built by string formatting
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
