//! Inline provenance markers.
//!
//! Generated prose carries references back to transcript events as bracketed
//! numerals using full-width brackets: `【12】`. The full-width form is
//! disjoint from ordinary `[12]` citations, so markers survive a round trip
//! through an external summarization call without colliding with prose.
//!
//! Everything downstream (remapping chunk-local markers to the global event
//! space, rendering citation links, stripping) goes through
//! [`extract_markers`] and [`rewrite_markers`], so the token syntax can
//! change without touching merge logic.

use regex::Regex;
use std::sync::OnceLock;

/// Match a `【n】` marker token, capturing the numeral.
fn marker_regex() -> &'static Regex {
    static MARKER_RE: OnceLock<Regex> = OnceLock::new();
    MARKER_RE.get_or_init(|| Regex::new(r"\u{3010}(\d+)\u{3011}").expect("Invalid regex"))
}

/// Encode a marker value as its inline token.
pub fn encode_marker(value: usize) -> String {
    format!("\u{3010}{}\u{3011}", value)
}

/// Extract all marker values from a text, duplicates preserved, in order of
/// appearance.
pub fn extract_markers(text: &str) -> Vec<usize> {
    marker_regex()
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Replace every marker occurrence with `f(value)`.
///
/// A pure, order-preserving, single-pass substitution. Text without markers
/// passes through unchanged. Used both for remapping (chunk-local to global)
/// and for final rendering (marker to citation link).
pub fn rewrite_markers(text: &str, mut f: impl FnMut(usize) -> String) -> String {
    marker_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            match caps[1].parse::<usize>() {
                Ok(value) => f(value),
                // Numeral too large for usize; leave the token as-is.
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Remove all marker tokens from a text.
pub fn strip_markers(text: &str) -> String {
    rewrite_markers(text, |_| String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_in_order_with_duplicates() {
        let text = "First point【3】 then another【1】 and again【3】.";
        assert_eq!(extract_markers(text), vec![3, 1, 3]);
    }

    #[test]
    fn test_extract_ignores_ascii_brackets() {
        assert_eq!(extract_markers("an ordinary citation [4] here"), Vec::<usize>::new());
    }

    #[test]
    fn test_no_markers_is_fine() {
        assert!(extract_markers("plain prose").is_empty());
        assert_eq!(rewrite_markers("plain prose", encode_marker), "plain prose");
    }

    #[test]
    fn test_identity_rewrite_returns_input_unchanged() {
        let text = "A【0】 mixed【12】 passage【3】 with markers.";
        assert_eq!(rewrite_markers(text, encode_marker), text);
    }

    #[test]
    fn test_rewrite_remaps_values() {
        let text = "start【0】 end【2】";
        let remapped = rewrite_markers(text, |m| encode_marker(m + 10));
        assert_eq!(remapped, "start【10】 end【12】");
    }

    #[test]
    fn test_rewrite_to_links() {
        let text = "claim【7】.";
        let rendered = rewrite_markers(text, |m| format!(" [[{}]](#ts-{})", m + 1, m + 1));
        assert_eq!(rendered, "claim [[8]](#ts-8).");
    }

    #[test]
    fn test_strip_markers() {
        assert_eq!(strip_markers("claim【7】 done【8】."), "claim done.");
    }
}
