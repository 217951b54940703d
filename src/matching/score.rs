//! Relevance scoring of a candidate record against a search term.

use similar::TextDiff;

use super::expand::words;

/// Name equals the term.
const EXACT_NAME: f64 = 1.0;

/// Term appears inside the name.
const NAME_CONTAINS: f64 = 0.9;

/// Every word of the term appears inside some word of the name.
const NAME_WORDS: f64 = 0.8;

/// Term appears inside the description.
const DESCRIPTION_CONTAINS: f64 = 0.6;

/// Keeps fuzzy description hits from outranking fuzzy name hits.
const DESCRIPTION_WEIGHT: f64 = 0.5;

/// Scores how well a record matches `term`, in `[0, 1]`.
///
/// Case-insensitive; a missing name or description counts as empty. The
/// first rule that applies wins:
///
/// 1. name equals term: `1.0`
/// 2. term is a substring of name: `0.9`
/// 3. each whitespace-separated word of term is a substring of some word of
///    name: `0.8`
/// 4. term is a substring of description: `0.6`
/// 5. otherwise the larger of `similarity(term, name)` and
///    `0.5 * similarity(term, description)`
pub fn score(term: &str, name: Option<&str>, description: Option<&str>) -> f64 {
    let term = term.to_lowercase();
    let name = name.unwrap_or_default().to_lowercase();
    let description = description.unwrap_or_default().to_lowercase();

    if term == name {
        return EXACT_NAME;
    }
    if !term.is_empty() && name.contains(&term) {
        return NAME_CONTAINS;
    }

    let mut term_words = term.split_whitespace().peekable();
    if term_words.peek().is_some() {
        let name_tokens: Vec<&str> = words(&name).collect();
        if term_words.all(|w| name_tokens.iter().any(|t| t.contains(w))) {
            return NAME_WORDS;
        }
    }

    if !term.is_empty() && description.contains(&term) {
        return DESCRIPTION_CONTAINS;
    }

    let by_name = similarity(&term, &name);
    let by_description = similarity(&term, &description) * DESCRIPTION_WEIGHT;
    by_name.max(by_description).clamp(0.0, 1.0)
}

/// Longest-common-subsequence ratio of two strings, case-insensitive.
///
/// Returns `2 * lcs / (len(a) + len(b))` counted in characters, so identical
/// strings score `1.0` and strings with nothing in common score `0.0`. An
/// empty operand always yields `0.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    f64::from(TextDiff::from_chars(a.as_str(), b.as_str()).ratio())
}
