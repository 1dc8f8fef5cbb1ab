use std::collections::BTreeSet;

/// Split text into words on single spaces. Runs of spaces never yield empty words.
pub fn split_into_words(text: &str) -> Vec<&str> {
    text.split(' ').filter(|w| !w.is_empty()).collect()
}

/// A word is valid when it holds no control characters (code points below 0x20).
pub fn is_valid_word(word: &str) -> bool {
    !word.chars().any(|c| (c as u32) < 0x20)
}

pub fn make_unique_non_empty_strings<I, S>(strings: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    strings
        .into_iter()
        .filter(|s| !s.as_ref().is_empty())
        .map(|s| s.as_ref().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_spaces() {
        assert_eq!(split_into_words("  cat in  the city "), vec!["cat", "in", "the", "city"]);
        assert!(split_into_words("").is_empty());
        assert!(split_into_words("    ").is_empty());
    }

    #[test]
    fn rejects_control_characters() {
        assert!(is_valid_word("скворец"));
        assert!(is_valid_word("-cat"));
        assert!(!is_valid_word("ca\x12t"));
        assert!(!is_valid_word("tab\there"));
    }

    #[test]
    fn unique_strings_drop_empty() {
        let set = make_unique_non_empty_strings(["in", "", "the", "in"]);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["in", "the"]);
    }
}
