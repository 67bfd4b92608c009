//! Special fenced blocks: `summary` and `tldr`.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceKind {
    Summary,
    Tldr,
}

fn fence_kind(info: &str) -> Option<FenceKind> {
    let lang = info.split_whitespace().next()?;
    if lang.eq_ignore_ascii_case("summary") {
        Some(FenceKind::Summary)
    } else if lang.eq_ignore_ascii_case("tldr") {
        Some(FenceKind::Tldr)
    } else {
        None
    }
}

/// Result of stage 3
#[derive(Debug, Default)]
pub struct Extracted {
    pub events: Vec<Event<'static>>,
    /// Lines of every `summary` fence, in document order
    pub summary: Vec<String>,
    /// Top-level blocks left in the document
    pub block_count: usize,
}

/// Remove `summary` fences into a side list and turn `tldr` fences into a
/// `<blockquote class="tldr">` holding the fence body parsed as Markdown.
pub fn extract_fences(events: Vec<Event<'static>>, options: Options) -> Extracted {
    let mut extracted = Extracted::default();
    let mut capture: Option<(FenceKind, String)> = None;
    let mut depth = 0usize;

    for event in events {
        if let Some((kind, body)) = capture.as_mut() {
            match event {
                Event::Text(text) => body.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    let kind = *kind;
                    let body = std::mem::take(body);
                    capture = None;
                    match kind {
                        FenceKind::Summary => {
                            extracted.summary.extend(body.lines().map(str::to_string));
                        }
                        FenceKind::Tldr => push_tldr(&mut extracted.events, &body, options),
                    }
                }
                _ => {}
            }
            continue;
        }

        if let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = &event {
            if let Some(kind) = fence_kind(info) {
                if kind == FenceKind::Tldr && depth == 0 {
                    extracted.block_count += 1;
                }
                capture = Some((kind, String::new()));
                continue;
            }
        }

        match &event {
            Event::Start(_) => {
                if depth == 0 {
                    extracted.block_count += 1;
                }
                depth += 1;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Rule if depth == 0 => extracted.block_count += 1,
            _ => {}
        }
        extracted.events.push(event);
    }

    extracted
}

fn push_tldr(events: &mut Vec<Event<'static>>, body: &str, options: Options) {
    events.push(Event::Html(CowStr::Borrowed("<blockquote class=\"tldr\">\n")));
    events.extend(Parser::new_ext(body, options).map(Event::into_static));
    events.push(Event::Html(CowStr::Borrowed("</blockquote>\n")));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(markdown: &str) -> Extracted {
        let events = Parser::new_ext(markdown, Options::empty())
            .map(Event::into_static)
            .collect();
        extract_fences(events, Options::empty())
    }

    fn html(events: &[Event<'static>]) -> String {
        let mut out = String::new();
        pulldown_cmark::html::push_html(&mut out, events.iter().cloned());
        out
    }

    #[test]
    fn test_summary_fence_is_removed() {
        let extracted = run("Intro\n\n```summary\nFirst line\n- second\n```\n\nOutro\n");
        assert_eq!(extracted.summary, vec!["First line", "- second"]);
        let out = html(&extracted.events);
        assert!(!out.contains("First line"));
        assert!(out.contains("<p>Intro</p>"));
        assert_eq!(extracted.block_count, 2);
    }

    #[test]
    fn test_tldr_fence_becomes_blockquote() {
        let extracted = run("```tldr\nShort **version**\n```\n");
        let out = html(&extracted.events);
        assert!(out.starts_with("<blockquote class=\"tldr\">"));
        assert!(out.contains("<strong>version</strong>"));
        assert_eq!(extracted.block_count, 1);
    }

    #[test]
    fn test_regular_fences_and_rules_count() {
        let extracted = run("# T\n\n```rust\nfn main() {}\n```\n\n---\n\n- a\n- b\n");
        assert_eq!(extracted.block_count, 4);
        assert!(extracted.summary.is_empty());
    }
}
