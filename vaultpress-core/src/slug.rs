//! Slug generation for heading anchors.

use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUNS: OnceLock<Regex> = OnceLock::new();

fn hyphen_runs() -> &'static Regex {
    HYPHEN_RUNS.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// Convert heading text to an anchor slug
///
/// Rules:
/// - Lowercase
/// - Whitespace becomes a hyphen
/// - Anything that isn't alphanumeric, `_` or `-` is dropped
/// - Runs of hyphens collapse, leading/trailing hyphens are trimmed
///
/// # Examples
///
/// ```
/// use vaultpress_core::slugify;
///
/// assert_eq!(slugify("Step One"), "step-one");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let lowercased = input.to_lowercase();

    let cleaned = lowercased
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if c.is_whitespace() {
                Some("-")
            } else if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(g)
            } else {
                None
            }
        })
        .collect::<String>();

    let collapsed = hyphen_runs().replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Intro"), "intro");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(slugify("Rust & Safety"), "rust-safety");
        assert_eq!(slugify("Node.js Tips"), "nodejs-tips");
        assert_eq!(slugify("What's new?"), "whats-new");
        assert_eq!(slugify("Costs ($5)"), "costs-5");
    }

    #[test]
    fn test_unicode() {
        assert_eq!(slugify("Café"), "café");
        assert_eq!(slugify("Tiếng Việt"), "tiếng-việt");
    }

    #[test]
    fn test_whitespace_and_hyphens() {
        assert_eq!(slugify("Hello    World"), "hello-world");
        assert_eq!(slugify("  -Leading and trailing-  "), "leading-and-trailing");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn test_empty_and_special_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("   "), "");
    }
}
