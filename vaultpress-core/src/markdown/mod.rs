//! Markdown processing pipeline.
//!
//! Stages run in a fixed order: pre-escape, parse, fence extraction, TOC,
//! link rewriting, highlighting, HTML generation, fragment re-parse, math,
//! inline-code reclassification, sanitizing, structural post-processing,
//! serialization and post-escape.

pub mod escape;
pub mod extract;
pub mod headings;
pub mod highlight;
pub mod links;
pub mod math;
pub mod toc;

use crate::alias::AliasGraph;
use crate::html::enhance::{enhance, reclassify_inline_code};
use crate::html::sanitize::sanitize;
use crate::html::serialize::serialize_children;
use crate::html::sink::parse_fragment;
use crate::models::{Document, RenderedDocument};
use crate::paths::route_for_source;
use escape::{post_escape, pre_escape};
use extract::{extract_fences, Extracted};
use headings::HeadingSlugRegistry;
use pulldown_cmark::{html, Event, Options, Parser};
use thiserror::Error;
use vaultpress_types::ContentPath;

pub use highlight::HighlightTransformer;
pub use links::LinkRewriter;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{route} is shadowed by an alias pointing at {target}")]
    ShadowedDocument {
        route: ContentPath,
        target: ContentPath,
    },
}

/// Per-build inputs shared by every document render
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    pub aliases: &'a AliasGraph,
    /// Public prefix for relative image sources
    pub asset_prefix: &'a str,
}

/// Markdown processor with the site's extensions enabled
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options.insert(Options::ENABLE_MATH);

        Self { options }
    }

    /// Render one document found at `source_path` (relative to the content
    /// root, extension included).
    ///
    /// Fails without rendering when the document's route is also an alias key.
    pub fn render(
        &self,
        document: &Document,
        source_path: &ContentPath,
        options: &RenderOptions<'_>,
    ) -> Result<RenderedDocument, RenderError> {
        let route = route_for_source(source_path);
        if let Some(target) = options.aliases.shadowed_by(&route) {
            return Err(RenderError::ShadowedDocument {
                target: target.clone(),
                route,
            });
        }

        let source = pre_escape(&document.raw_body);
        let Extracted {
            events,
            summary,
            block_count,
        } = extract_fences(self.parse(&source), self.options);

        let headings = toc::collect_headings(&events);
        let registry = toc::observe_headings(&headings);
        let heading_ids = toc::assign_ids(&headings, &registry);
        let toc = toc::build_toc(&headings, &heading_ids);
        let events = toc::apply_heading_ids(events, &heading_ids);

        let rewriter = LinkRewriter::new(source_path, options.aliases, options.asset_prefix);
        let events = rewriter.transform(events);
        let events = HighlightTransformer::new().transform(events);

        let html = finish_document(&to_html(events), &registry);

        let summary_source = summary_source(&summary, &document.frontmatter.ai_generated_summary);
        let summary_html = if summary_source.trim().is_empty() {
            String::new()
        } else {
            self.render_summary(&summary_source, source_path, options)
        };

        tracing::debug!(
            "Rendered {} ({} blocks, {} headings)",
            source_path,
            block_count,
            headings.len()
        );

        Ok(RenderedDocument {
            html,
            toc,
            summary_html,
            block_count,
            frontmatter: document.frontmatter.clone(),
        })
    }

    /// Convert markdown to sanitized HTML with no aliases and no asset prefix
    pub fn convert_simple(&self, markdown: &str) -> String {
        let aliases = AliasGraph::empty();
        let options = RenderOptions {
            aliases: &aliases,
            asset_prefix: "/",
        };
        let document = Document {
            frontmatter: Default::default(),
            raw_body: markdown.to_string(),
        };
        match self.render(&document, &ContentPath::new("/index.md"), &options) {
            Ok(rendered) => rendered.html,
            Err(_) => String::new(),
        }
    }

    fn parse(&self, source: &str) -> Vec<Event<'static>> {
        Parser::new_ext(source, self.options)
            .map(Event::into_static)
            .collect()
    }

    /// Reduced pipeline for summary text: parse, drop nested summary fences,
    /// rewrite links, generate, sanitize, serialize
    fn render_summary(
        &self,
        source: &str,
        source_path: &ContentPath,
        options: &RenderOptions<'_>,
    ) -> String {
        let source = pre_escape(source);
        let events: Vec<Event<'static>> = extract_fences(self.parse(&source), Options::empty()).events;
        let rewriter = LinkRewriter::new(source_path, options.aliases, options.asset_prefix);
        let raw = to_html(rewriter.transform(events));

        let (mut tree, body) = parse_fragment(&raw);
        sanitize(&mut tree, body);
        post_escape(&serialize_children(&tree, body))
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn to_html(events: Vec<Event<'static>>) -> String {
    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

/// Tree stages for the document body
fn finish_document(raw: &str, registry: &HeadingSlugRegistry) -> String {
    let (mut tree, body) = parse_fragment(raw);
    math::render_math(&mut tree, body);
    reclassify_inline_code(&mut tree, body);
    let stats = sanitize(&mut tree, body);
    if stats.dropped_elements + stats.unwrapped_elements + stats.dropped_attributes > 0 {
        tracing::trace!("Sanitizer removed content: {:?}", stats);
    }
    enhance(&mut tree, body, registry);
    post_escape(&serialize_children(&tree, body))
}

/// Summary fence lines followed by any generated summary paragraphs
fn summary_source(lines: &[String], generated: &[String]) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !lines.is_empty() {
        parts.push(lines.join("\n"));
    }
    parts.extend(
        generated
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );
    parts.join("\n\n")
}
