//! Per-document heading id assignment.
//!
//! Ids are assigned in two passes. Pass 1 walks every heading and records
//! `text -> base slug`. Pass 2 hands out ids in document order: the first
//! heading with a given text gets the base slug, the Nth gets `base-N`.
//! Pass 2 runs once while the TOC is built and the ids ride on the heading
//! events into the HTML; the post-processing pass only fills in headings
//! that came from raw HTML.

use crate::markdown::escape::post_escape;
use crate::slug::slugify;
use std::collections::{HashMap, HashSet};

/// Only these heading levels get ids and TOC entries
pub const TOC_DEPTHS: std::ops::RangeInclusive<u8> = 2..=5;

const EMPTY_SLUG: &str = "section";

/// Slug for heading text (currency placeholders restored first)
pub fn slugify_heading(text: &str) -> String {
    slugify(&post_escape(text))
}

/// Pass-1 table of heading text to base slug. Lives for one document.
#[derive(Debug, Clone, Default)]
pub struct HeadingSlugRegistry {
    bases: HashMap<String, String>,
}

impl HeadingSlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heading's text
    pub fn observe(&mut self, text: &str) {
        let key = heading_key(text);
        if !self.bases.contains_key(&key) {
            let base = slugify_heading(&key);
            self.bases.insert(key, base);
        }
    }

    /// Base slug for a heading text; unseen text is slugified on the spot
    pub fn base_for(&self, text: &str) -> String {
        let key = heading_key(text);
        let base = match self.bases.get(&key) {
            Some(base) => base.clone(),
            None => slugify_heading(&key),
        };
        if base.is_empty() {
            EMPTY_SLUG.to_string()
        } else {
            base
        }
    }

    /// Start a pass-2 assignment
    pub fn ids(&self) -> HeadingIds<'_> {
        HeadingIds {
            registry: self,
            occurrences: HashMap::new(),
            used: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

/// Pass-2 id assignment with its own occurrence counters
#[derive(Debug)]
pub struct HeadingIds<'a> {
    registry: &'a HeadingSlugRegistry,
    occurrences: HashMap<String, usize>,
    used: HashSet<String>,
}

impl HeadingIds<'_> {
    /// Id for the next heading with this text
    pub fn assign(&mut self, text: &str) -> String {
        let key = heading_key(text);
        let base = self.registry.base_for(&key);
        let count = self.occurrences.entry(key).or_insert(0);
        *count += 1;

        let mut n = *count;
        let mut candidate = if n == 1 {
            base.clone()
        } else {
            format!("{base}-{n}")
        };
        // A different heading may already own this id.
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }
        self.used.insert(candidate.clone());
        candidate
    }

    /// Mark an author-supplied id as taken
    pub fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }
}

fn heading_key(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
