use once_cell::sync::Lazy;
use regex::Regex;

static WS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws run"));
static ARABIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u0600-\u06FF]").expect("arabic"));
static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("non word"));

/// Trim, collapse internal whitespace runs to a single space, and fold
/// typographic quotes to their plain ASCII forms.
pub fn normalize_text(s: &str) -> String {
    let collapsed = WS_RUN_RE.replace_all(s.trim(), " ");
    collapsed
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

pub fn has_arabic(text: &str) -> bool {
    ARABIC_RE.is_match(text)
}

/// Lowercased text with all punctuation/symbols removed. Base form for
/// identity signatures: formatting noise must not split otherwise-equal
/// question stems.
pub fn strip_punct_lower(text: &str) -> String {
    NON_WORD_RE
        .replace_all(&text.to_lowercase(), "")
        .into_owned()
}
