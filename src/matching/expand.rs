//! Query expansion: one search term to many encoded-query variants.
//!
//! Backend `LIKE` matching is sensitive to separators ("dev-banking",
//! "dev banking" and "devbanking" are different strings to it), so the term
//! is rewritten under each separator convention and every rewrite is queried
//! several ways. Ranking happens client-side afterwards.

/// Field holding the record name.
const NAME_FIELD: &str = "name";

/// Field holding the record identifier.
const ID_FIELD: &str = "sys_id";

/// Field holding the free-text description.
const DESCRIPTION_FIELD: &str = "short_description";

/// Returns true for characters that belong to a word (letters, digits, `_`).
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits `text` into words on every run of non-word characters.
pub(crate) fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty())
}

/// Escapes user text for an encoded query, where `^` separates conditions.
pub fn escape_query_value(value: &str) -> String {
    value.replace('^', "^^")
}

/// Lowercases and trims `term`, then rewrites it under each separator
/// convention.
///
/// The result is an ordered set: first-seen order is preserved because it
/// decides which query runs first. The trimmed, lowercased term itself is
/// always the first entry; rewrites left with nothing but whitespace are
/// dropped.
pub fn normalized_variants(term: &str) -> Vec<String> {
    let base = term.trim().to_lowercase();

    let rewrites = [
        base.clone(),
        base.replace(' ', "-"),
        base.replace(' ', "_"),
        base.replace(' ', ""),
        base.replace('-', " "),
        base.replace('_', " "),
        base.replace('-', ""),
        base.replace('_', ""),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(rewrites.len());
    for (i, candidate) in rewrites.into_iter().enumerate() {
        if i > 0 && candidate.trim().is_empty() {
            continue;
        }
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

/// Expands a search term into the ordered list of encoded queries to run.
///
/// For each normalized variant `v` this yields `name=v`, `sys_id=v`,
/// `nameLIKEv` and `short_descriptionLIKEv`. When `v` holds more than one
/// word it also yields a conjunction requiring every word in the name,
/// followed by one name query and one description query per word.
///
/// Duplicate queries are allowed; the aggregator deduplicates by record.
pub fn expand(term: &str) -> Vec<String> {
    let mut queries = Vec::new();

    for variant in normalized_variants(term) {
        let escaped = escape_query_value(&variant);
        queries.push(format!("{NAME_FIELD}={escaped}"));
        queries.push(format!("{ID_FIELD}={escaped}"));
        queries.push(format!("{NAME_FIELD}LIKE{escaped}"));
        queries.push(format!("{DESCRIPTION_FIELD}LIKE{escaped}"));

        let parts: Vec<String> = words(&variant).map(escape_query_value).collect();
        if parts.len() > 1 {
            let conjunction = parts
                .iter()
                .map(|w| format!("{NAME_FIELD}LIKE{w}"))
                .collect::<Vec<_>>()
                .join("^");
            queries.push(conjunction);

            queries.extend(parts.iter().map(|w| format!("{NAME_FIELD}LIKE{w}")));
            queries.extend(parts.iter().map(|w| format!("{DESCRIPTION_FIELD}LIKE{w}")));
        }
    }

    queries
}
