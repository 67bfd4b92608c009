//! Code syntax highlighting using syntect.
//!
//! Highlighting is class-based (`<span class="source rust">`…) so the
//! stylesheet owns the colours and the sanitizer only has to allow `class`.

use crate::html::serialize::escape_html;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// First word of a fence info string, reduced to characters safe in a class name
fn fence_language(info: &str) -> Option<String> {
    let lang: String = info
        .split_whitespace()
        .next()?
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'))
        .collect();
    (!lang.is_empty()).then_some(lang)
}

/// Transformer for syntax highlighting fenced code blocks
pub struct HighlightTransformer;

impl HighlightTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Replace fenced blocks in a known language with highlighted HTML.
    /// Everything else, including unknown languages, passes through.
    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut pending: Option<(String, &'static SyntaxReference, Vec<Event<'static>>)> = None;

        for event in events {
            if let Some((code, _, held)) = pending.as_mut() {
                match event {
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some((code, syntax, held)) = pending.take() {
                            match self.highlight_code(&code, syntax, held_language(&held)) {
                                Some(html) => result.push(Event::Html(CowStr::from(html))),
                                None => {
                                    result.extend(held);
                                    result.push(Event::End(TagEnd::CodeBlock));
                                }
                            }
                        }
                    }
                    other => {
                        if let Event::Text(text) = &other {
                            code.push_str(text);
                        }
                        held.push(other);
                    }
                }
                continue;
            }

            if let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = &event {
                if let Some(syntax) = fence_language(info).and_then(|lang| lookup(&lang)) {
                    pending = Some((String::new(), syntax, vec![event]));
                    continue;
                }
            }
            result.push(event);
        }

        // An unterminated block is emitted as it came in.
        if let Some((_, _, held)) = pending {
            result.extend(held);
        }
        result
    }

    fn highlight_code(&self, code: &str, syntax: &SyntaxReference, lang: String) -> Option<String> {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set(), ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
                tracing::debug!("Falling back to plain code for {}: {}", lang, err);
                return None;
            }
        }
        Some(format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            escape_html(&lang),
            generator.finalize()
        ))
    }
}

impl Default for HighlightTransformer {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup(lang: &str) -> Option<&'static SyntaxReference> {
    let ss = syntax_set();
    ss.find_syntax_by_token(lang)
        .or_else(|| ss.find_syntax_by_extension(lang))
        .filter(|syntax| syntax.name != "Plain Text")
}

fn held_language(held: &[Event<'static>]) -> String {
    match held.first() {
        Some(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))) => {
            fence_language(info).unwrap_or_default()
        }
        _ => String::new(),
    }
}
