//! The canonical bibliographic record shared by every source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::title::{TitleKey, short_code, shorten_author};

/// Sentinel written into `author`/`year`/`title` when a source omits them.
pub const MISSING_FIELD: &str = "NA";

/// One bibliographic entry. Field names follow BibTeX conventions
/// (`title`, `author`, `year`, `abstract`, `url`, ...); fields a source
/// returns beyond the common set are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaperRecord {
    pub entry_type: String,
    pub cite_key: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl PaperRecord {
    pub fn new(entry_type: &str) -> Self {
        Self {
            entry_type: entry_type.to_lowercase(),
            cite_key: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn author(&self) -> Option<&str> {
        self.get("author")
    }

    pub fn year(&self) -> Option<&str> {
        self.get("year")
    }

    pub fn url(&self) -> Option<&str> {
        self.get("url")
    }

    pub fn title_key(&self) -> TitleKey {
        TitleKey::new(self.title().unwrap_or_default())
    }

    /// Every field value, in field-name order. Input to keyword filtering.
    pub fn text_fields(&self) -> Vec<&str> {
        self.fields.values().map(String::as_str).collect()
    }

    /// Derive and store the cite key: lead-author token + year + title
    /// short code. Missing vital fields are imputed as [`MISSING_FIELD`].
    ///
    /// Distinct papers sharing author, year and short code collide; no
    /// suffixing is applied.
    pub fn assign_cite_key(&mut self) {
        for name in ["author", "year", "title"] {
            if !self.fields.contains_key(name) {
                warn!(
                    field = name,
                    "record is missing a vital field, imputing '{MISSING_FIELD}'"
                );
                self.set(name, MISSING_FIELD);
            }
        }

        let author = self.get("author").unwrap_or(MISSING_FIELD);
        let author_token = if author.contains(',') {
            let lead = author.split(',').next().unwrap_or(author);
            shorten_author(lead).to_lowercase()
        } else {
            let first = author.split(" and ").next().unwrap_or(author);
            let surname = first.split_whitespace().last().unwrap_or(first);
            shorten_author(surname).to_lowercase()
        };

        let year = self.get("year").unwrap_or(MISSING_FIELD);
        let title = self.get("title").unwrap_or(MISSING_FIELD);
        self.cite_key = Some(format!("{author_token}{year}{}", short_code(title)));
    }
}

/// Collapse whitespace runs (including newlines) into single spaces.
pub fn clean_field_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(author: &str, year: &str, title: &str) -> PaperRecord {
        let mut r = PaperRecord::new("article");
        r.set("author", author);
        r.set("year", year);
        r.set("title", title);
        r
    }

    #[test]
    fn cite_key_from_comma_separated_author() {
        let mut r = record("Smith, John", "2021", "A New Method");
        r.assign_cite_key();
        assert_eq!(r.cite_key.as_deref(), Some("smith2021anm"));
    }

    #[test]
    fn cite_key_from_and_separated_authors() {
        let mut r = record("John Smith and Jane Doe", "2019", "Deep Learning for NLP");
        r.assign_cite_key();
        assert_eq!(r.cite_key.as_deref(), Some("smith2019dlfn"));
    }

    #[test]
    fn missing_fields_are_imputed() {
        let mut r = PaperRecord::new("misc");
        r.set("title", "Orphan Paper");
        r.assign_cite_key();
        assert_eq!(r.author(), Some(MISSING_FIELD));
        assert_eq!(r.year(), Some(MISSING_FIELD));
        assert_eq!(r.cite_key.as_deref(), Some("naNAop"));
    }

    #[test]
    fn clean_field_text_squashes_whitespace() {
        assert_eq!(
            clean_field_text("a  broken\nabstract\n  text"),
            "a broken abstract text"
        );
    }
}
