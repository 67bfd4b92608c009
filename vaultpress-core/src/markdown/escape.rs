//! Source pre-escaping and output post-escaping.
//!
//! Currency amounts like `$5` would otherwise open an inline math span, so
//! they are swapped for a placeholder before parsing and restored in the
//! final HTML. Multi-line `$$…$$` blocks are folded onto one line so they
//! parse as a single display math span. Fenced code is left untouched.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Stands in for a literal `$` in front of a digit
pub const CURRENCY_PLACEHOLDER: &str = "VPCURRENCYDOLLAR";

static DISPLAY_MATH_REGEX: OnceLock<Regex> = OnceLock::new();
static FENCE_REGEX: OnceLock<Regex> = OnceLock::new();

fn display_math_regex() -> &'static Regex {
    DISPLAY_MATH_REGEX.get_or_init(|| Regex::new(r"(?s)\$\$(.+?)\$\$").unwrap())
}

fn fence_regex() -> &'static Regex {
    FENCE_REGEX.get_or_init(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})(.*)").unwrap())
}

/// Stage 1: protect currency and fold display math, outside fenced code
pub fn pre_escape(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for (in_fence, chunk) in split_fences(source) {
        if in_fence {
            out.push_str(&chunk);
        } else {
            out.push_str(&collapse_display_math(&protect_currency(&chunk)));
        }
    }
    out
}

/// Stage 13: put the literal `$` back
pub fn post_escape(html: &str) -> String {
    html.replace(CURRENCY_PLACEHOLDER, "$")
}

/// Replace `$<digit>` (not preceded by `\` or another `$`) with the placeholder
pub fn protect_currency(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        let escaped = matches!(prev, Some('\\') | Some('$'));
        if ch == '$' && !escaped && chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            out.push_str(CURRENCY_PLACEHOLDER);
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    out
}

/// Fold every `$$…$$` block onto a single line
pub fn collapse_display_math(text: &str) -> String {
    display_math_regex()
        .replace_all(text, |caps: &Captures| {
            let folded = caps[1]
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            format!("$${folded}$$")
        })
        .into_owned()
}

/// Split source into alternating (is_fenced_code, text) chunks
fn split_fences(source: &str) -> Vec<(bool, String)> {
    let mut chunks: Vec<(bool, String)> = Vec::new();
    // (fence character, fence length) of the open block
    let mut open: Option<(char, usize)> = None;

    for line in source.split_inclusive('\n') {
        let marker = fence_regex().captures(line).and_then(|caps| {
            let run = caps.get(1)?.as_str();
            let rest = caps.get(2).map_or("", |m| m.as_str());
            Some((run.chars().next()?, run.len(), rest.trim().is_empty()))
        });

        let in_fence = match (open, marker) {
            (None, Some((ch, len, _))) => {
                open = Some((ch, len));
                true
            }
            (Some((ch, len)), Some((close_ch, close_len, bare)))
                if close_ch == ch && close_len >= len && bare =>
            {
                open = None;
                true
            }
            (Some(_), _) => true,
            (None, None) => false,
        };

        match chunks.last_mut() {
            Some((kind, text)) if *kind == in_fence => text.push_str(line),
            _ => chunks.push((in_fence, line.to_string())),
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_round_trip() {
        let escaped = pre_escape("It costs $5 or $10.\n$3 at line start.");
        assert!(!escaped.contains("$5"));
        assert!(!escaped.contains("$1"));
        assert!(!escaped.contains("$3"));
        assert_eq!(post_escape(&escaped), "It costs $5 or $10.\n$3 at line start.");
    }

    #[test]
    fn test_adjacent_amounts() {
        let escaped = protect_currency("$1$2 and 5$3");
        assert!(!escaped.contains('$'));
        assert_eq!(post_escape(&escaped), "$1$2 and 5$3");
    }

    #[test]
    fn test_math_dollars_are_kept() {
        assert_eq!(protect_currency("$x^2$ and \\$5 and $$1$$"), "$x^2$ and \\$5 and $$1$$");
    }

    #[test]
    fn test_display_math_is_folded() {
        let src = "Before\n\n$$\na + b\n= c\n$$\n\nAfter";
        assert_eq!(pre_escape(src), "Before\n\n$$a + b = c$$\n\nAfter");
    }

    #[test]
    fn test_fenced_code_is_untouched() {
        let src = "Pay $5\n\n```sh\necho $1\n$$\n```\n\nthen $6";
        let escaped = pre_escape(src);
        assert!(escaped.contains("echo $1\n$$\n"));
        assert!(escaped.contains(&format!("Pay {CURRENCY_PLACEHOLDER}5")));
        assert!(escaped.contains(&format!("then {CURRENCY_PLACEHOLDER}6")));
    }
}
