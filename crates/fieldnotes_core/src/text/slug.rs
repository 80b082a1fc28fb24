//! Title slugification.
//!
//! Must stay byte-for-byte compatible with the keys stored by the record
//! repository, otherwise cross-reference matches silently fail.

/// Converts a title into its URL-safe key.
///
/// Rules:
/// - alphanumeric characters are lowercased and kept;
/// - every run of other characters collapses to one `-`;
/// - leading and trailing `-` are removed.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Reef Fishing"), "reef-fishing");
        assert_eq!(slugify("Reef Fishing 2"), "reef-fishing-2");
    }

    #[test]
    fn slugify_collapses_and_trims_separators() {
        assert_eq!(slugify("  --Canoe  building!! (1998) "), "canoe-building-1998");
        assert_eq!(slugify("a__b"), "a-b");
    }

    #[test]
    fn slugify_of_punctuation_only_is_empty() {
        assert_eq!(slugify(" !? -- "), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn slugify_keeps_non_ascii_letters() {
        assert_eq!(slugify("Ñandú Dance"), "ñandú-dance");
    }
}
