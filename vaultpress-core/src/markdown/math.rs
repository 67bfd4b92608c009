//! MathJax-compatible math rendering over the parsed HTML tree.
//!
//! pulldown-cmark emits math as `<span class="math math-inline">` and
//! `<span class="math math-display">` with escaped LaTeX inside. After the
//! fragment parse the LaTeX is plain decoded text, which is wrapped in the
//! delimiters MathJax processes client-side.

use crate::html::tree::{HtmlTree, NodeId};

pub const INLINE_CLASS: &str = "math-inline";
pub const DISPLAY_CLASS: &str = "math-display";

/// Stage 8: render every math span under `root`; returns how many were rendered
pub fn render_math(tree: &mut HtmlTree, root: NodeId) -> usize {
    let spans: Vec<NodeId> = tree
        .elements_named(root, "span")
        .into_iter()
        .filter(|&id| tree.has_class(id, INLINE_CLASS) || tree.has_class(id, DISPLAY_CLASS))
        .collect();

    for &span in &spans {
        let latex = tree.text_content(span);
        let display = tree.has_class(span, DISPLAY_CLASS);
        for child in tree.children(span).to_vec() {
            tree.detach(child);
        }

        let wrapped = if display {
            format!("\\[{latex}\\]")
        } else {
            format!("\\({latex}\\)")
        };
        tree.append_text(span, &wrapped);
        tree.set_attr(span, "aria-label", latex);
        tree.add_class(span, "math");

        if display {
            tree.rename(span, "div");
            if let Some(paragraph) = sole_paragraph(tree, span) {
                tree.unwrap(paragraph);
            }
        }
    }

    tracing::trace!("Rendered {} math spans", spans.len());
    spans.len()
}

/// The `<p>` around `id` when `id` is its only non-blank content
fn sole_paragraph(tree: &HtmlTree, id: NodeId) -> Option<NodeId> {
    let parent = tree.parent(id)?;
    if !tree.is_element(parent, "p") {
        return None;
    }
    let alone = tree.children(parent).iter().all(|&child| {
        child == id || tree.text(child).is_some_and(|text| text.trim().is_empty())
    });
    alone.then_some(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::serialize::serialize_children;
    use crate::html::sink::parse_fragment;

    fn render(html: &str) -> String {
        let (mut tree, body) = parse_fragment(html);
        render_math(&mut tree, body);
        serialize_children(&tree, body)
    }

    #[test]
    fn test_inline_math() {
        let out = render(r#"<p>Area <span class="math math-inline">x &lt; y</span></p>"#);
        assert_eq!(
            out,
            r#"<p>Area <span class="math math-inline" aria-label="x < y">\(x &lt; y\)</span></p>"#
        );
    }

    #[test]
    fn test_display_math_replaces_its_paragraph() {
        let out = render(r#"<p><span class="math math-display">\sum_i i</span></p>"#);
        assert_eq!(
            out,
            r#"<div class="math math-display" aria-label="\sum_i i">\[\sum_i i\]</div>"#
        );
    }

    #[test]
    fn test_display_math_inside_text_keeps_paragraph() {
        let out = render(r#"<p>see <span class="math math-display">a</span> here</p>"#);
        assert!(out.starts_with("<p>see <div"));
    }

    #[test]
    fn test_other_spans_untouched() {
        assert_eq!(render("<p><span class=\"x\">a</span></p>"), "<p><span class=\"x\">a</span></p>");
    }
}
