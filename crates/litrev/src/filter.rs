//! Deduplication and keyword filtering over titles and records.

use std::collections::HashSet;

use tracing::debug;

use crate::keyword::KeywordExpr;
use crate::record::PaperRecord;
use crate::title::TitleKey;

/// Anything with a title and a set of text fields to filter on.
pub trait Titled {
    fn title_text(&self) -> &str;
    fn filter_fields(&self) -> Vec<&str>;
}

impl Titled for String {
    fn title_text(&self) -> &str {
        self
    }

    fn filter_fields(&self) -> Vec<&str> {
        vec![self.as_str()]
    }
}

impl Titled for PaperRecord {
    fn title_text(&self) -> &str {
        self.title().unwrap_or_default()
    }

    fn filter_fields(&self) -> Vec<&str> {
        self.text_fields()
    }
}

/// Drop items whose normalized title was already seen. The first
/// occurrence wins; relative order is preserved. Equality is
/// [`TitleKey`] equality, not the initials fingerprint: two different
/// papers may share initials.
pub fn dedupe<T: Titled>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        let key = TitleKey::new(item.title_text());
        if seen.insert(key) {
            kept.push(item);
        } else {
            debug!("dropping duplicate '{}'", item.title_text());
        }
    }
    kept
}

/// Keep items with at least one field matching the expression.
pub fn filter_by_keyword<T: Titled>(items: Vec<T>, expr: &KeywordExpr) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| expr.matches(&item.filter_fields()))
        .collect()
}

/// Keyword-filter bare titles, then dedupe the survivors.
pub fn filter_titles(titles: Vec<String>, expr: &KeywordExpr) -> Vec<String> {
    dedupe(filter_by_keyword(titles, expr))
}

/// Keyword-filter records over every field, then dedupe.
pub fn filter_records(records: Vec<PaperRecord>, expr: &KeywordExpr) -> Vec<PaperRecord> {
    dedupe(filter_by_keyword(records, expr))
}

/// As [`filter_records`], but only the named fields are searched.
/// Fields a record lacks are simply absent from its haystack.
pub fn filter_records_fields(
    records: Vec<PaperRecord>,
    fields: &[&str],
    expr: &KeywordExpr,
) -> Vec<PaperRecord> {
    let matching = records
        .into_iter()
        .filter(|record| {
            let values: Vec<&str> = fields.iter().filter_map(|name| record.get(name)).collect();
            expr.matches(&values)
        })
        .collect();
    dedupe(matching)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_of_normalized_duplicates() {
        let titles = vec![
            "Deep Learning for NLP".to_string(),
            "deep learning for nlp.".to_string(),
            "Another Paper".to_string(),
        ];
        let kept = dedupe(titles);
        assert_eq!(kept, ["Deep Learning for NLP", "Another Paper"]);
    }

    #[test]
    fn dedupe_keeps_distinct_titles_sharing_initials() {
        let titles = vec!["Neural Networks".to_string(), "No Nonsense".to_string()];
        let kept = dedupe(titles);
        assert_eq!(kept, ["Neural Networks", "No Nonsense"]);
    }

    #[test]
    fn keyword_filter_over_records_sees_every_field() {
        let mut a = PaperRecord::new("article");
        a.set("title", "A Survey of Methods");
        a.set("abstract", "We review deep learning.");
        let mut b = PaperRecord::new("article");
        b.set("title", "Shallow Models");

        let expr = KeywordExpr::literal("deep");
        let kept = filter_by_keyword(vec![a, b], &expr);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title(), Some("A Survey of Methods"));
    }

    #[test]
    fn field_subset_ignores_other_fields() {
        let mut a = PaperRecord::new("article");
        a.set("title", "Shallow Models");
        a.set("abstract", "deep learning everywhere");
        let mut b = PaperRecord::new("article");
        b.set("title", "Deep Models");

        let expr = KeywordExpr::literal("deep");
        let kept = filter_records_fields(vec![a, b], &["title"], &expr);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title(), Some("Deep Models"));
    }

    #[test]
    fn filter_titles_also_dedupes() {
        let titles = vec![
            "Deep Learning".to_string(),
            "deep learning.".to_string(),
            "Shallow Stuff".to_string(),
        ];
        let kept = filter_titles(titles, &KeywordExpr::literal("deep"));
        assert_eq!(kept, ["Deep Learning"]);
    }

    #[test]
    fn negated_keyword_excludes_matches() {
        let titles = vec![
            "A Survey of Deep Learning".to_string(),
            "Deep Learning in Practice".to_string(),
        ];
        let expr = KeywordExpr::all_of(["deep", "~survey"]);
        let kept = filter_by_keyword(titles, &expr);
        assert_eq!(kept, ["Deep Learning in Practice"]);
    }
}
