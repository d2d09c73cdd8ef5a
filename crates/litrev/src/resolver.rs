//! Cascading resolution of titles into records across prioritized sources.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::bibtex;
use crate::record::PaperRecord;
use crate::sources::{DEFAULT_ORDER, PaperSource, SourceId};
use crate::title::titles_match;

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Reject a hit whose title short code differs from the query's.
    pub check_title: bool,
    /// Derive and store the cite key on the returned record.
    pub assign_key: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            check_title: true,
            assign_key: true,
        }
    }
}

/// Tries each registered source in priority order and returns the first
/// acceptable record. Source failures are logged and absorbed; a failing
/// provider never blocks the ones after it.
pub struct RecordResolver {
    sources: HashMap<SourceId, Arc<dyn PaperSource>>,
    order: Vec<SourceId>,
}

impl RecordResolver {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            order: DEFAULT_ORDER.to_vec(),
        }
    }

    pub fn with_source(mut self, id: SourceId, source: Arc<dyn PaperSource>) -> Self {
        self.sources.insert(id, source);
        self
    }

    /// Override the priority order. Ids without a registered source are
    /// skipped at resolution time.
    pub fn with_order(mut self, order: Vec<SourceId>) -> Self {
        self.order = order;
        self
    }

    pub async fn resolve(&self, title: &str, opts: ResolveOptions) -> Option<PaperRecord> {
        for id in &self.order {
            let Some(source) = self.sources.get(id) else {
                continue;
            };
            let record = match source.fetch(title).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(source = source.name(), "source failed for '{title}': {e}");
                    continue;
                }
            };
            if opts.check_title {
                let found = record.title().unwrap_or_default();
                if !titles_match(title, found) {
                    warn!(
                        source = source.name(),
                        "'{found}' does not match '{title}', trying next source"
                    );
                    continue;
                }
            }
            let mut record = record;
            if opts.assign_key {
                record.assign_cite_key();
            }
            info!(source = source.name(), "resolved '{title}'");
            return Some(record);
        }
        warn!("no source could resolve '{title}'");
        None
    }

    /// Resolve a batch sequentially, keeping the hits and sorting them by
    /// year ascending. Records without a year sort last.
    pub async fn resolve_many(&self, titles: &[String], opts: ResolveOptions) -> Vec<PaperRecord> {
        let total = titles.len();
        let mut records = Vec::new();
        for (i, title) in titles.iter().enumerate() {
            info!("resolving {}/{total}: '{title}'", i + 1);
            if let Some(record) = self.resolve(title, opts).await {
                records.push(record);
            }
        }
        records.sort_by(|a, b| {
            a.year()
                .unwrap_or("9999")
                .cmp(b.year().unwrap_or("9999"))
        });
        records
    }

    pub async fn bibtex(&self, title: &str, opts: ResolveOptions) -> Option<String> {
        self.resolve(title, opts)
            .await
            .map(|record| bibtex::serialize(&record))
    }

    pub async fn bibtex_many(&self, titles: &[String], opts: ResolveOptions) -> String {
        let records = self.resolve_many(titles, opts).await;
        bibtex::serialize_many(&records)
    }
}

impl Default for RecordResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::{LitrevError, Result};

    struct Fixed {
        name: &'static str,
        record: Option<PaperRecord>,
    }

    #[async_trait]
    impl PaperSource for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, _title: &str) -> Result<Option<PaperRecord>> {
            Ok(self.record.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl PaperSource for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self, _title: &str) -> Result<Option<PaperRecord>> {
            Err(LitrevError::Parse("boom".to_string()))
        }
    }

    fn record(title: &str, year: &str) -> PaperRecord {
        let mut r = PaperRecord::new("article");
        r.set("title", title);
        r.set("author", "Smith, John");
        r.set("year", year);
        r
    }

    #[tokio::test]
    async fn first_matching_source_wins() {
        let resolver = RecordResolver::new()
            .with_source(
                SourceId::Arxiv,
                Arc::new(Fixed {
                    name: "arxiv",
                    record: Some(record("Deep Learning", "2015")),
                }),
            )
            .with_source(
                SourceId::LocalArchive,
                Arc::new(Fixed {
                    name: "own",
                    record: Some(record("Deep Learning", "1999")),
                }),
            );

        let hit = resolver
            .resolve("Deep Learning", ResolveOptions::default())
            .await
            .unwrap();
        assert_eq!(hit.year(), Some("2015"));
        assert_eq!(hit.cite_key.as_deref(), Some("smith2015dl"));
    }

    #[tokio::test]
    async fn failing_source_falls_through() {
        let resolver = RecordResolver::new()
            .with_source(SourceId::Arxiv, Arc::new(Failing))
            .with_source(
                SourceId::LocalArchive,
                Arc::new(Fixed {
                    name: "own",
                    record: Some(record("Deep Learning", "2015")),
                }),
            );

        let hit = resolver
            .resolve("Deep Learning", ResolveOptions::default())
            .await;
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn mismatched_title_is_rejected_when_checked() {
        let resolver = RecordResolver::new().with_source(
            SourceId::Arxiv,
            Arc::new(Fixed {
                name: "arxiv",
                record: Some(record("Something Else Entirely", "2015")),
            }),
        );

        assert!(
            resolver
                .resolve("Deep Learning", ResolveOptions::default())
                .await
                .is_none()
        );

        let unchecked = resolver
            .resolve(
                "Deep Learning",
                ResolveOptions {
                    check_title: false,
                    ..Default::default()
                },
            )
            .await;
        assert!(unchecked.is_some());
    }

    struct ByTitle;

    #[async_trait]
    impl PaperSource for ByTitle {
        fn name(&self) -> &'static str {
            "own"
        }

        async fn fetch(&self, title: &str) -> Result<Option<PaperRecord>> {
            Ok(match title {
                "Alpha" => Some(record("Alpha", "2020")),
                "Beta" => Some(record("Beta", "2005")),
                "Undated" => {
                    let mut r = PaperRecord::new("misc");
                    r.set("title", "Undated");
                    Some(r)
                }
                _ => None,
            })
        }
    }

    #[tokio::test]
    async fn resolve_many_sorts_by_year_with_missing_last() {
        let resolver = RecordResolver::new().with_source(SourceId::LocalArchive, Arc::new(ByTitle));
        let titles: Vec<String> = ["Undated", "Alpha", "Beta", "Missing"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let records = resolver
            .resolve_many(
                &titles,
                ResolveOptions {
                    check_title: true,
                    assign_key: false,
                },
            )
            .await;
        let order: Vec<_> = records.iter().filter_map(PaperRecord::title).collect();
        assert_eq!(order, ["Beta", "Alpha", "Undated"]);
    }
}
