//! Search-key normalization shared by the sync and backfill paths.

/// Canonical search key for `text`: lowercase, with every space and
/// underscore removed. Empty input yields an empty key.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    text.to_lowercase().chars().filter(|c| *c != ' ' && *c != '_').collect()
}

/// Key derived from the title when one is present and non-empty, else from the slug.
#[must_use]
pub fn search_key_for(title: Option<&str>, slug: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => normalize_text(t),
        _ => normalize_text(slug),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_separators() {
        assert_eq!(normalize_text("Multiple Word Topic"), "multiplewordtopic");
        assert_eq!(normalize_text("Test_Topic"), "testtopic");
        assert_eq!(normalize_text("A _ B__C  D"), "abcd");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" _ "), "");
    }

    #[test]
    fn idempotent_on_mixed_input() {
        for input in ["Multiple Word Topic", "AT&T", "Ünïcode_Straße", "ΟΔΥΣΣΕΥΣ Ithaca", "_x_", ""] {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn keeps_other_whitespace_and_punctuation() {
        assert_eq!(normalize_text("Tab\tSeparated"), "tab\tseparated");
        assert_eq!(normalize_text("C++ (Language)"), "c++(language)");
    }

    #[test]
    fn title_wins_over_slug() {
        assert_eq!(search_key_for(Some("Bill Clinton"), "ignored_slug"), "billclinton");
        assert_eq!(search_key_for(None, "Bill_Clinton"), "billclinton");
        assert_eq!(search_key_for(Some(""), "Bill_Clinton"), "billclinton");
    }
}
