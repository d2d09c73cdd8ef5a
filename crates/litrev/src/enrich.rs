//! Citation statistics: absolute counts plus a citations-per-day rate
//! that makes recent and old papers comparable.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::{LitrevError, Result};
use crate::retry::RetryPolicy;
use crate::sources::arxiv::ArxivSource;
use crate::sources::scholar::ScholarClient;
use crate::sources::semantic_scholar::{S2Paper, SemanticScholarSource};
use crate::title::titles_match;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CitationStats {
    pub count: Option<u32>,
    pub daily_rate: Option<f64>,
    pub publication_date: Option<NaiveDate>,
}

/// Citations per day since publication. Papers published today count as
/// one day old so the rate stays finite.
pub fn daily_rate(count: u32, published: NaiveDate, today: NaiveDate) -> f64 {
    let days = (today - published).num_days().max(1);
    f64::from(count) / days as f64
}

/// A date for a record that only carries a year: January 1st of that
/// year. Sentinel years (anything containing 'n', like "NA") get none.
pub fn impute_date(year: &str) -> Option<NaiveDate> {
    if year.to_lowercase().contains('n') {
        return None;
    }
    let year: i32 = year.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, 1, 1)
}

fn assemble(count: Option<u32>, date: Option<NaiveDate>, today: NaiveDate) -> CitationStats {
    let rate = match (count, date) {
        (Some(count), Some(date)) => Some(daily_rate(count, date, today)),
        _ => None,
    };
    CitationStats {
        count,
        daily_rate: rate,
        publication_date: date,
    }
}

/// Pulls citation counts and publication dates together from the
/// scholarly backend, arXiv and Semantic Scholar, in that order of
/// preference for each missing piece.
pub struct CitationEnricher {
    scholar: Option<Arc<dyn ScholarClient>>,
    arxiv: Option<Arc<ArxivSource>>,
    semantic: Arc<SemanticScholarSource>,
    retry: RetryPolicy,
}

impl CitationEnricher {
    pub fn new(semantic: Arc<SemanticScholarSource>, retry: RetryPolicy) -> Self {
        Self {
            scholar: None,
            arxiv: None,
            semantic,
            retry,
        }
    }

    pub fn with_scholar(mut self, scholar: Arc<dyn ScholarClient>) -> Self {
        self.scholar = Some(scholar);
        self
    }

    pub fn with_arxiv(mut self, arxiv: Arc<ArxivSource>) -> Self {
        self.arxiv = Some(arxiv);
        self
    }

    /// Stats straight off an already-fetched Semantic Scholar paper.
    pub fn stats_for_paper(paper: &S2Paper, today: NaiveDate) -> CitationStats {
        let date = paper
            .publication_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .or_else(|| {
                paper
                    .year
                    .map(|y| y.to_string())
                    .as_deref()
                    .and_then(impute_date)
            });
        assemble(paper.citation_count, date, today)
    }

    pub async fn stats(&self, title: &str, semantic_only: bool) -> Result<CitationStats> {
        self.stats_at(title, semantic_only, Utc::now().date_naive())
            .await
    }

    /// As [`stats`](Self::stats), with the reference day injected. The
    /// semantic-only path errors when the paper is unknown; the full
    /// chain degrades to missing values, erroring only when no provider
    /// knows anything at all.
    pub async fn stats_at(
        &self,
        title: &str,
        semantic_only: bool,
        today: NaiveDate,
    ) -> Result<CitationStats> {
        if semantic_only {
            let hit = self
                .retry
                .run("semantic scholar stats", || self.semantic.search_one(title))
                .await?;
            return match hit.filter(|paper| titles_match(title, &paper.title)) {
                Some(paper) => Ok(Self::stats_for_paper(&paper, today)),
                None => Err(LitrevError::NotFound(title.to_string())),
            };
        }

        let mut count: Option<u32> = None;
        let mut date: Option<NaiveDate> = None;
        let mut scholar_year: Option<String> = None;
        let mut semantic_year: Option<String> = None;

        if let Some(scholar) = &self.scholar {
            match self.scholar_lookup(scholar, title).await {
                Ok(Some((c, y))) => {
                    count = c;
                    scholar_year = y;
                }
                Ok(None) => {}
                Err(e) => warn!("scholar lookup failed for '{title}': {e}"),
            }
        }
        if let Some(arxiv) = &self.arxiv {
            match arxiv.locate(title).await {
                Ok(Some(entry)) if titles_match(title, &entry.title) => {
                    date = Some(entry.published.date_naive());
                }
                Ok(_) => {}
                Err(e) => warn!("arxiv lookup failed for '{title}': {e}"),
            }
        }

        if count.is_none() || date.is_none() {
            match self
                .retry
                .run("semantic scholar stats", || self.semantic.search_one(title))
                .await
            {
                Ok(hit) => {
                    if let Some(paper) = hit.filter(|p| titles_match(title, &p.title)) {
                        if count.is_none() {
                            count = paper.citation_count;
                        }
                        if date.is_none() {
                            date = paper
                                .publication_date
                                .as_deref()
                                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
                        }
                        semantic_year = paper.year.map(|y| y.to_string());
                    }
                }
                Err(e) => warn!("semantic scholar lookup failed for '{title}': {e}"),
            }
        }

        // Scholar's year is preferred, but its sentinel years ("nan") fail
        // the imputation guard and fall through to Semantic Scholar's.
        let date = date
            .or_else(|| scholar_year.as_deref().and_then(impute_date))
            .or_else(|| semantic_year.as_deref().and_then(impute_date));
        if count.is_none() && date.is_none() {
            return Err(LitrevError::NotFound(title.to_string()));
        }
        Ok(assemble(count, date, today))
    }

    async fn scholar_lookup(
        &self,
        scholar: &Arc<dyn ScholarClient>,
        title: &str,
    ) -> Result<Option<(Option<u32>, Option<String>)>> {
        let Some(hit) = self
            .retry
            .run("scholar search", || scholar.search_single(title))
            .await?
        else {
            return Ok(None);
        };
        if !titles_match(title, &hit.title) {
            return Ok(None);
        }
        let filled = self
            .retry
            .run("scholar fill", || scholar.fill(&hit))
            .await?;
        Ok(Some((filled.num_citations, filled.pub_year)))
    }

    /// Stats for a batch. Failures are logged and skipped; the returned
    /// maps hold the known counts and daily rates keyed by title.
    pub async fn stats_many(
        &self,
        titles: &[String],
        semantic_only: bool,
    ) -> (BTreeMap<String, u32>, BTreeMap<String, f64>) {
        let mut counts = BTreeMap::new();
        let mut rates = BTreeMap::new();
        let total = titles.len();
        for (i, title) in titles.iter().enumerate() {
            info!("citation stats {}/{total}: '{title}'", i + 1);
            match self.stats(title, semantic_only).await {
                Ok(stats) => {
                    if let Some(count) = stats.count {
                        counts.insert(title.clone(), count);
                    }
                    if let Some(rate) = stats.daily_rate {
                        rates.insert(title.clone(), rate);
                    }
                }
                Err(e) => warn!("no citation stats for '{title}': {e}"),
            }
        }
        (counts, rates)
    }
}
