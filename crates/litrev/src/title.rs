//! Title canonicalization used for matching, deduplication and cite keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized form of a title. Two titles with the same key are treated as
/// the same paper everywhere in the crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TitleKey(String);

impl TitleKey {
    pub fn new(title: &str) -> Self {
        let lowered = title.to_lowercase();
        let trimmed =
            lowered.trim_matches(|c: char| c.is_whitespace() || c == '.' || c == '-');
        Self(trimmed.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TitleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Initials of every alphabetic token of the lower-cased title.
/// `"Deep Learning for NLP"` becomes `"dlfn"`.
pub fn short_code(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphabetic() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter_map(|token| token.chars().next())
        .collect()
}

/// The sole fuzzy-match rule: short codes must agree. Deliberately coarse so
/// that punctuation and subtitle noise does not reject a correct hit.
pub fn titles_match(a: &str, b: &str) -> bool {
    short_code(a) == short_code(b)
}

/// Alphabetic-only fold of an author name, used by cite key derivation.
pub fn shorten_author(author: &str) -> String {
    author.chars().filter(|c| c.is_alphabetic()).collect()
}
