//! Content model structs for documents, rendered output and diagnostics.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use vaultpress_types::{ContentPath, TocItem};

/// Frontmatter metadata from markdown files
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Frontmatter {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "string_or_list")]
    pub tags: Vec<String>,

    /// Short aliases declared inline by the author
    #[serde(default, deserialize_with = "string_or_list")]
    pub redirect: Vec<String>,

    #[serde(default)]
    pub pinned: bool,

    #[serde(default)]
    pub draft: bool,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub date: Option<String>,

    #[serde(default)]
    pub ai_summary: bool,

    #[serde(default, deserialize_with = "string_or_list")]
    pub ai_generated_summary: Vec<String>,

    /// Fields the pipeline does not consume, passed through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Frontmatter {
    /// Parse `date` as a calendar date, accepting `YYYY-MM-DD` with an
    /// optional time suffix.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_yaml::Value::Null) => Vec::new(),
        Some(serde_yaml::Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(other) => scalar_string(&other).into_iter().collect(),
    })
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_string))
}

fn scalar_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A parsed source file: frontmatter plus the markdown body
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub frontmatter: Frontmatter,
    pub raw_body: String,
}

/// Output of the markdown pipeline for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    pub html: String,
    pub toc: Vec<TocItem>,
    pub summary_html: String,
    pub block_count: usize,
    pub frontmatter: Frontmatter,
}

/// A rendered document placed in the site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// URL the page is served under
    pub route: ContentPath,

    /// Source file relative to the content root (with extension)
    pub source_path: ContentPath,

    /// Display title (frontmatter title, falling back to the file stem)
    pub title: String,

    pub date: Option<NaiveDate>,

    #[serde(flatten)]
    pub document: RenderedDocument,
}

impl Page {
    pub fn is_draft(&self) -> bool {
        self.document.frontmatter.draft
    }
}

/// Severity of a build diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Info,
    Warning,
    Error,
}

/// A build-time diagnostic surfaced to operators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable machine-readable code, e.g. `alias.missing-target`
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    /// Content path the diagnostic is about, if any
    pub path: Option<String>,
    /// Extra context (alias key, redirect target, ...)
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(code: &str, severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity,
            path: None,
            context: None,
        }
    }

    pub fn with_path(mut self, path: impl ToString) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Complete build result: every rendered page plus diagnostics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteIndex {
    pub pages: Vec<Page>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SiteIndex {
    /// Find a page by its route
    pub fn find_by_route(&self, route: &str) -> Option<&Page> {
        let route = ContentPath::new(route);
        self.pages.iter().find(|p| p.route == route)
    }

    /// Pinned, non-draft pages
    pub fn pinned(&self) -> Vec<&Page> {
        self.pages
            .iter()
            .filter(|p| !p.is_draft() && p.document.frontmatter.pinned)
            .collect()
    }

    pub fn errors(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontmatter_scalars_and_lists() {
        let fm: Frontmatter = serde_yaml::from_str(
            "title: Hello\ntags: rust\nredirect:\n  - /s/abc\n  - short\ndate: 2024-03-01\npinned: true\n",
        )
        .unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello"));
        assert_eq!(fm.tags, vec!["rust"]);
        assert_eq!(fm.redirect, vec!["/s/abc", "short"]);
        assert!(fm.pinned);
        assert!(!fm.draft);
        assert_eq!(fm.parsed_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_numeric_title() {
        let fm: Frontmatter = serde_yaml::from_str("title: 1984\n").unwrap();
        assert_eq!(fm.title.as_deref(), Some("1984"));
    }

    #[test]
    fn test_frontmatter_keeps_unknown_fields() {
        let fm: Frontmatter = serde_yaml::from_str("title: X\nauthors:\n  - alice\n").unwrap();
        assert!(fm.extra.contains_key("authors"));
    }

    #[test]
    fn test_date_with_time_suffix() {
        let fm = Frontmatter {
            date: Some("2023-11-05T10:00:00Z".into()),
            ..Default::default()
        };
        assert_eq!(fm.parsed_date(), NaiveDate::from_ymd_opt(2023, 11, 5));
    }

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::new("alias.missing-target", DiagnosticSeverity::Warning, "gone")
            .with_path("/old")
            .with_context("/new");
        assert_eq!(diag.path.as_deref(), Some("/old"));
        assert_eq!(diag.context.as_deref(), Some("/new"));
    }
}
