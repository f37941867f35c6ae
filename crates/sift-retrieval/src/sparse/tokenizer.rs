//! Tokenization shared by the index and search paths: lowercase, split on
//! non-alphanumeric, drop empty tokens. Index and query MUST tokenize
//! identically or term statistics drift.

use std::collections::HashMap;

use sift_core::traits::TermPosting;

pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Tokenize and aggregate into term postings plus the document's token
/// count. Postings come back term-sorted for deterministic persistence.
pub fn build_postings(text: &str) -> (Vec<TermPosting>, u32) {
    let tokens = tokenize(text);
    let token_count = tokens.len() as u32;

    let mut tf: HashMap<String, u32> = HashMap::new();
    for token in tokens {
        *tf.entry(token).or_default() += 1;
    }

    let mut postings: Vec<TermPosting> = tf
        .into_iter()
        .map(|(term, term_frequency)| TermPosting {
            term,
            term_frequency,
        })
        .collect();
    postings.sort_by(|a, b| a.term.cmp(&b.term));

    (postings, token_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_non_alphanumeric() {
        assert_eq!(
            tokenize("Hello, World! rust-lang_2024"),
            vec!["hello", "world", "rust", "lang", "2024"]
        );
    }

    #[test]
    fn drops_empty_tokens() {
        assert_eq!(tokenize("...  --- !!!"), Vec::<String>::new());
        assert_eq!(tokenize(""), Vec::<String>::new());
    }

    #[test]
    fn postings_aggregate_frequencies() {
        let (postings, count) = build_postings("cats and cats and dogs");
        assert_eq!(count, 5);
        let cats = postings.iter().find(|p| p.term == "cats").unwrap();
        assert_eq!(cats.term_frequency, 2);
        let dogs = postings.iter().find(|p| p.term == "dogs").unwrap();
        assert_eq!(dogs.term_frequency, 1);
    }

    #[test]
    fn postings_are_term_sorted() {
        let (postings, _) = build_postings("zebra apple mango");
        let terms: Vec<&str> = postings.iter().map(|p| p.term.as_str()).collect();
        assert_eq!(terms, vec!["apple", "mango", "zebra"]);
    }
}
