//! Frontmatter parsing from markdown files.

use crate::models::{Document, Frontmatter};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Frontmatter must be a mapping")]
    NotAMapping,
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)\A\u{FEFF}?---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n(.*))?\z").unwrap()
    })
}

/// Parse frontmatter from markdown content
///
/// Returns a tuple of (frontmatter, markdown_body).
/// If no frontmatter is present, returns default frontmatter with the full content as body.
///
/// # Example
///
/// ```
/// use vaultpress_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: My Post\ndate: 2025-01-01\n---\n# Hello World\n";
///
/// let (fm, body) = parse_frontmatter(content).unwrap();
/// assert_eq!(fm.title.as_deref(), Some("My Post"));
/// assert_eq!(fm.date.as_deref(), Some("2025-01-01"));
/// assert!(body.trim().starts_with("# Hello World"));
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let re = frontmatter_regex();

    let Some(captures) = re.captures(content) else {
        return Ok((Frontmatter::default(), content.to_string()));
    };

    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    let frontmatter = match value {
        serde_yaml::Value::Null => Frontmatter::default(),
        serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value)?,
        _ => return Err(FrontmatterError::NotAMapping),
    };

    Ok((frontmatter, body.to_string()))
}

impl Document {
    /// Parse a whole source file into frontmatter and body
    pub fn parse(content: &str) -> Result<Self, FrontmatterError> {
        let (frontmatter, raw_body) = parse_frontmatter(content)?;
        Ok(Self {
            frontmatter,
            raw_body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
title: Test Post
description: A test post
date: 2025-01-01
tags:
  - rust
  - programming
---

# Hello World

This is the content."#;

        let (fm, body) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Test Post"));
        assert_eq!(fm.description.as_deref(), Some("A test post"));
        assert_eq!(fm.date.as_deref(), Some("2025-01-01"));
        assert_eq!(fm.tags, vec!["rust", "programming"]);
        assert!(body.contains("# Hello World"));
        assert!(body.contains("This is the content."));
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let (fm, body) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.title, None);
        assert_eq!(body, content);
    }

    #[test]
    fn test_parse_frontmatter_without_body() {
        let (fm, body) = parse_frontmatter("---\ntitle: Only Meta\n---").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Only Meta"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_parse_crlf_frontmatter() {
        let content = "---\r\ntitle: Windows\r\ndraft: true\r\n---\r\nBody";
        let doc = Document::parse(content).unwrap();
        assert_eq!(doc.frontmatter.title.as_deref(), Some("Windows"));
        assert!(doc.frontmatter.draft);
        assert_eq!(doc.raw_body, "Body");
    }

    #[test]
    fn test_parse_redirect_and_summary_fields() {
        let content = r#"---
title: Notes
redirect:
  - /s/abc123
ai_summary: true
ai_generated_summary: Short take on the notes.
---
Body"#;
        let doc = Document::parse(content).unwrap();
        assert_eq!(doc.frontmatter.redirect, vec!["/s/abc123"]);
        assert!(doc.frontmatter.ai_summary);
        assert_eq!(
            doc.frontmatter.ai_generated_summary,
            vec!["Short take on the notes."]
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let content = r#"---
title: Test
invalid yaml: [unclosed
---

Content."#;

        assert!(parse_frontmatter(content).is_err());
    }

    #[test]
    fn test_scalar_frontmatter_rejected() {
        let result = parse_frontmatter("---\njust a string\n---\nBody");
        assert!(matches!(result, Err(FrontmatterError::NotAMapping)));
    }
}
