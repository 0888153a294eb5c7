//! Deterministic normalisation of raw review text.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static SYMBOL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\w\s.,!?;:()"'-]"#).expect("valid regex"));
static WHITESPACE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Clean one raw review: unescape HTML entities, drop markup and stray
/// symbols, collapse whitespace runs, trim. Idempotent: ampersands and angle
/// brackets never survive the symbol pass, so a second run is a no-op.
pub fn clean(text: &str) -> String {
    let unescaped = html_escape::decode_html_entities(text);
    let without_tags = TAG_PATTERN.replace_all(&unescaped, " ");
    let without_symbols = SYMBOL_PATTERN.replace_all(&without_tags, " ");
    let collapsed = WHITESPACE_PATTERN.replace_all(&without_symbols, " ");
    collapsed.trim().to_string()
}

/// Clean a whole batch, preserving order.
pub fn clean_batch(texts: &[String]) -> Vec<String> {
    texts.iter().map(|t| clean(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::clean;

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(clean("<b>Great&nbsp;value</b> &amp; fast"), "Great value fast");
    }

    #[test]
    fn keeps_basic_punctuation() {
        assert_eq!(clean("Nice, really! (5/5)"), "Nice, really! (5 5)");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean("  too \t many\n\nspaces  "), "too many spaces");
    }
}
