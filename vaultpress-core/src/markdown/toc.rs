//! Table of contents extraction from the event stream.

use super::headings::{HeadingSlugRegistry, TOC_DEPTHS};
use super::escape::post_escape;
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use vaultpress_types::TocItem;

/// A heading as seen in the event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingInfo {
    pub depth: u8,
    /// Plain text, with inline math in `\(…\)` form
    pub text: String,
    /// Id given with `{#id}`
    pub explicit_id: Option<String>,
}

/// Collect depth 2–5 headings in document order.
///
/// Image alt text is not part of a heading's visible text and is skipped.
pub fn collect_headings(events: &[Event<'_>]) -> Vec<HeadingInfo> {
    let mut headings = Vec::new();
    let mut current: Option<HeadingInfo> = None;
    let mut image_depth = 0usize;

    for event in events {
        match event {
            Event::Start(Tag::Image { .. }) => image_depth += 1,
            Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
            Event::Text(_) | Event::Code(_) | Event::InlineMath(_) if image_depth > 0 => {}
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some(HeadingInfo {
                    depth: *level as u8,
                    text: String::new(),
                    explicit_id: id
                        .as_ref()
                        .filter(|s| !s.is_empty())
                        .map(|s| s.to_string()),
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(text);
                }
            }
            Event::InlineMath(math) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&format!("\\({math}\\)"));
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push(' ');
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    if TOC_DEPTHS.contains(&heading.depth) {
                        headings.push(heading);
                    }
                }
            }
            _ => {}
        }
    }

    headings
}

/// Pass 1 over the collected headings
pub fn observe_headings(headings: &[HeadingInfo]) -> HeadingSlugRegistry {
    let mut registry = HeadingSlugRegistry::new();
    for heading in headings {
        registry.observe(&heading.text);
    }
    registry
}

/// Pass 2: one id per collected heading, in document order.
///
/// Author ids are all reserved before any id is generated.
pub fn assign_ids(headings: &[HeadingInfo], registry: &HeadingSlugRegistry) -> Vec<String> {
    let mut ids = registry.ids();
    for explicit in headings.iter().filter_map(|h| h.explicit_id.as_deref()) {
        ids.reserve(explicit);
    }
    headings
        .iter()
        .map(|heading| match &heading.explicit_id {
            Some(explicit) => explicit.clone(),
            None => ids.assign(&heading.text),
        })
        .collect()
}

/// Build the nested TOC from the headings and their assigned ids
pub fn build_toc(headings: &[HeadingInfo], ids: &[String]) -> Vec<TocItem> {
    let mut toc: Vec<TocItem> = Vec::new();
    for (heading, id) in headings.iter().zip(ids) {
        let value = post_escape(heading.text.trim());
        insert(&mut toc, TocItem::new(id.clone(), value, heading.depth));
    }
    toc
}

/// Write the assigned ids onto the depth 2–5 heading events, so the HTML
/// carries exactly the anchors the TOC points at
pub fn apply_heading_ids(events: Vec<Event<'static>>, ids: &[String]) -> Vec<Event<'static>> {
    let mut ids = ids.iter();
    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) if TOC_DEPTHS.contains(&(level as u8)) => {
                let id = ids.next().map(|id| CowStr::from(id.clone())).or(id);
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                })
            }
            other => other,
        })
        .collect()
}

/// Nest under the last item while the new item is deeper
fn insert(items: &mut Vec<TocItem>, item: TocItem) {
    match items.last_mut() {
        Some(last) if item.depth > last.depth => insert(&mut last.children, item),
        _ => items.push(item),
    }
}
