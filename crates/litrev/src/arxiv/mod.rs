pub mod client;
pub mod parser;
pub mod types;

use crate::keyword::KeywordExpr;
use types::ArxivEntry;

/// Titles of the feed entries whose title or summary pass the filter.
/// The parser has already collapsed newlines and double spaces.
pub fn select_titles(entries: &[ArxivEntry], expr: &KeywordExpr) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| expr.matches(&[entry.title.as_str(), entry.summary.as_str()]))
        .map(|entry| entry.title.clone())
        .collect()
}
