//! Canonicalization of raw token names.
//!
//! Template authors paste placeholder names from word processors, so raw
//! names arrive with smart quotes, unicode dashes and stray punctuation.
//! Mapping lookups happen on the cleaned form only.

/// The sentinel token name whose rendered content is a literal quote mark.
///
/// `{{u0022}}` stands for the quote character itself, so the name is kept
/// verbatim instead of being stripped like a descriptive name would be.
pub const QUOTE_SENTINEL: &str = "u0022";

/// Replacement rendered for the quote sentinel: a left curly double quote.
pub const QUOTE_GLYPH: &str = "\u{201c}";

/// Whether the raw name is the quote sentinel (case-insensitive, trimmed).
pub fn is_quote_sentinel(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case(QUOTE_SENTINEL)
}

/// Cleans and canonicalizes a raw placeholder name.
///
/// Steps, in order: trim; reject bare quote characters; map unicode
/// quote/dash variants to ASCII; strip surrounding quotes; drop characters
/// outside `[A-Za-z0-9 _-]`; collapse whitespace runs to a single space.
/// Returns `None` when nothing survives cleaning. Idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> Option<String> {
    // The sentinel is content, not a descriptive name. Short-circuit.
    if is_quote_sentinel(raw) {
        return Some(QUOTE_SENTINEL.to_string());
    }

    let mut name = raw.trim().to_string();
    if name.is_empty() {
        return None;
    }

    // A name that is just a quote character is an authoring artifact.
    if matches!(
        name.as_str(),
        "\"" | "'" | "\u{201c}" | "\u{201d}" | "\u{2018}" | "\u{2019}"
    ) {
        return None;
    }

    // Map unicode quote and dash variants to their ASCII equivalents.
    const REPLACEMENTS: &[(char, char)] = &[
        ('\u{201c}', '"'),  // left double quotation mark
        ('\u{201d}', '"'),  // right double quotation mark
        ('\u{2018}', '\''), // left single quotation mark
        ('\u{2019}', '\''), // right single quotation mark
        ('\u{201b}', '\''), // single high-reversed-9 quotation mark
        ('\u{2032}', '\''), // prime
        ('\u{2033}', '"'),  // double prime
        ('\u{2013}', '-'),  // en dash
        ('\u{2014}', '-'),  // em dash
        ('\u{2015}', '-'),  // horizontal bar
    ];
    for &(from, to) in REPLACEMENTS {
        if name.contains(from) {
            name = name.replace(from, &to.to_string());
        }
    }

    // Strip quotes wrapping the whole name.
    let mut trimmed = name.trim_matches('"').trim().trim_matches('\'').trim();
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        if (bytes[0] == b'"' || bytes[0] == b'\'')
            && (bytes[trimmed.len() - 1] == b'"' || bytes[trimmed.len() - 1] == b'\'')
        {
            trimmed = trimmed[1..trimmed.len() - 1].trim();
        }
    }
    if trimmed.is_empty() {
        return None;
    }

    // Keep alphanumerics, space, underscore and hyphen only.
    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_collapses_whitespace() {
        assert_eq!(normalize("  project   Name  ").as_deref(), Some("project Name"));
    }

    #[test]
    fn strips_surrounding_quotes() {
        assert_eq!(normalize("\"companyName\"").as_deref(), Some("companyName"));
        assert_eq!(normalize("'heading_1'").as_deref(), Some("heading_1"));
        assert_eq!(
            normalize("\u{201c}projectName\u{201d}").as_deref(),
            Some("projectName")
        );
    }

    #[test]
    fn maps_unicode_dashes() {
        assert_eq!(normalize("side\u{2013}heading").as_deref(), Some("side-heading"));
        assert_eq!(normalize("a\u{2014}b").as_deref(), Some("a-b"));
    }

    #[test]
    fn drops_disallowed_characters() {
        assert_eq!(normalize("effort_estimation_?").as_deref(), Some("effort_estimation_"));
        assert_eq!(normalize("logo#2!").as_deref(), Some("logo2"));
    }

    #[test]
    fn empty_and_quote_only_names_are_rejected() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("\""), None);
        assert_eq!(normalize("\u{201d}"), None);
    }

    #[test]
    fn quote_sentinel_is_preserved_verbatim() {
        assert_eq!(normalize("u0022").as_deref(), Some(QUOTE_SENTINEL));
        assert_eq!(normalize("  U0022 ").as_deref(), Some(QUOTE_SENTINEL));
        assert!(is_quote_sentinel(" u0022 "));
        assert!(!is_quote_sentinel("u0022x"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "  project   Name  ",
            "\"companyName\"",
            "side\u{2013}heading",
            "effort_estimation_?",
            "u0022",
            "'\u{201c}odd \u{2014} name\u{201d}'",
        ];
        for raw in samples {
            if let Some(once) = normalize(raw) {
                let twice = normalize(&once);
                assert_eq!(twice.as_deref(), Some(once.as_str()), "raw: {raw:?}");
            }
        }
    }
}
