//! Query parsing: plus words must occur in a document, `-`-prefixed minus words must not.

use std::collections::BTreeSet;

use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words};

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueryWord<'a> {
    data: &'a str,
    is_minus: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query<'a> {
    pub plus_words: Vec<&'a str>,
    pub minus_words: Vec<&'a str>,
}

impl<'a> Query<'a> {
    /// Sorted, deduplicated plus and minus words.
    pub fn parse(text: &'a str, stop_words: &BTreeSet<String>) -> Result<Self> {
        let mut query = Self::parse_raw(text, stop_words)?;
        query.plus_words.sort_unstable();
        query.plus_words.dedup();
        query.minus_words.sort_unstable();
        query.minus_words.dedup();
        Ok(query)
    }

    /// Words in query order, duplicates kept.
    pub fn parse_raw(text: &'a str, stop_words: &BTreeSet<String>) -> Result<Self> {
        let mut query = Query::default();
        for word in split_into_words(text) {
            let word = parse_query_word(word)?;
            if stop_words.contains(word.data) {
                continue;
            }
            if word.is_minus {
                query.minus_words.push(word.data);
            } else {
                query.plus_words.push(word.data);
            }
        }
        Ok(query)
    }
}

fn parse_query_word(text: &str) -> Result<QueryWord<'_>> {
    let (data, is_minus) = match text.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if data.is_empty() {
        return Err(SearchError::invalid_content(format!("query word {text:?} is empty after '-'")));
    }
    if data.starts_with('-') {
        return Err(SearchError::invalid_content(format!("query word {text:?} is doubly negated")));
    }
    if !is_valid_word(data) {
        return Err(SearchError::invalid_content(format!(
            "query word {text:?} contains control characters"
        )));
    }
    Ok(QueryWord { data, is_minus })
}
