//! One-hop citation-graph expansion: from seed papers to the titles they
//! cite and are cited by, minus everything already known.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::keyword::KeywordExpr;
use crate::retry::RetryPolicy;
use crate::sources::semantic_scholar::{S2Neighbor, SemanticScholarSource};
use crate::title::{TitleKey, titles_match};

pub struct CitationGraphCrawler {
    semantic: Arc<SemanticScholarSource>,
    retry: RetryPolicy,
}

impl CitationGraphCrawler {
    pub fn new(semantic: Arc<SemanticScholarSource>, retry: RetryPolicy) -> Self {
        Self { semantic, retry }
    }

    /// Expand every seed by one hop in both directions and return the
    /// normalized titles of new neighbors matching `expr`, in discovery
    /// order. Titles in `known` are never reported; when no `known` list
    /// is given the seeds themselves play that role. An explicit list
    /// replaces the seeds entirely, so a seed showing up as a neighbor
    /// of another seed is still reported unless the list names it.
    pub async fn crawl_one_hop(
        &self,
        seeds: &[String],
        known: Option<&[String]>,
        expr: &KeywordExpr,
    ) -> Result<Vec<String>> {
        let mut seen: std::collections::HashSet<TitleKey> = known
            .unwrap_or(seeds)
            .iter()
            .map(|t| TitleKey::new(t))
            .collect();

        let mut found = Vec::new();
        let total = seeds.len();
        for (i, seed) in seeds.iter().enumerate() {
            info!("crawling {}/{total}: '{seed}'", i + 1);
            let hit = self
                .retry
                .run("crawler seed search", || self.semantic.search_one(seed))
                .await?;
            let Some(paper) = hit.filter(|p| titles_match(seed, &p.title)) else {
                warn!("seed '{seed}' not found, skipping");
                continue;
            };

            let id = paper.id();
            let neighbors: Vec<S2Neighbor> = self
                .semantic
                .citations(&id)
                .await?
                .into_iter()
                .chain(self.semantic.references(&id).await?)
                .collect();

            for neighbor in neighbors {
                let key = TitleKey::new(&neighbor.title);
                if !seen.insert(key) {
                    continue;
                }
                let fields = [
                    neighbor.title.as_str(),
                    neighbor.abstract_text.as_deref().unwrap_or_default(),
                ];
                if expr.matches(&fields) {
                    found.push(TitleKey::new(&neighbor.title).into_string());
                }
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;

    fn crawler(server: &Server) -> CitationGraphCrawler {
        CitationGraphCrawler::new(
            Arc::new(SemanticScholarSource::with_base_url(
                &server.url(),
                None,
                RetryPolicy::new(2, Duration::from_millis(1)),
            )),
            RetryPolicy::new(2, Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn reports_new_matching_neighbors_only() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/paper/search")
            .match_query(Matcher::Any)
            .with_body(
                json!({"data": [{"paperId": "seed", "title": "Deep Learning"}]}).to_string(),
            )
            .create_async()
            .await;
        let _citations = server
            .mock("GET", "/paper/seed/citations")
            .match_query(Matcher::Any)
            .with_body(
                json!({"data": [
                    {"citingPaper": {"title": "Deep Survey.", "abstract": "deep things"}},
                    {"citingPaper": {"title": "Known Paper", "abstract": "deep too"}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;
        let _references = server
            .mock("GET", "/paper/seed/references")
            .match_query(Matcher::Any)
            .with_body(
                json!({"data": [
                    {"citedPaper": {"title": "Shallow Roots", "abstract": "nothing relevant"}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let seeds = vec!["Deep Learning".to_string()];
        let known = vec!["known paper".to_string()];
        let found = crawler(&server)
            .crawl_one_hop(&seeds, Some(&known), &KeywordExpr::literal("deep"))
            .await
            .unwrap();
        // The seed itself, the known paper and the non-matching reference
        // are all excluded; the survey comes back normalized.
        assert_eq!(found, ["deep survey"]);
    }

    #[tokio::test]
    async fn explicit_known_list_replaces_seed_exclusion() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/paper/search")
            .match_query(Matcher::Any)
            .with_body(
                json!({"data": [{"paperId": "seed", "title": "Deep Learning"}]}).to_string(),
            )
            .create_async()
            .await;
        let _citations = server
            .mock("GET", "/paper/seed/citations")
            .match_query(Matcher::Any)
            .with_body(
                json!({"data": [
                    {"citingPaper": {"title": "Deep Learning", "abstract": "the seed cites itself"}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;
        let _references = server
            .mock("GET", "/paper/seed/references")
            .match_query(Matcher::Any)
            .with_body(json!({"data": []}).to_string())
            .create_async()
            .await;

        let seeds = vec!["Deep Learning".to_string()];
        let known = vec!["Unrelated Paper".to_string()];
        let found = crawler(&server)
            .crawl_one_hop(&seeds, Some(&known), &KeywordExpr::Any)
            .await
            .unwrap();
        // The known list does not name the seed, so its reappearance as a
        // neighbor is reported.
        assert_eq!(found, ["deep learning"]);
    }

    #[tokio::test]
    async fn missing_seed_is_skipped_not_fatal() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/paper/search")
            .match_query(Matcher::Any)
            .with_body(json!({"data": []}).to_string())
            .create_async()
            .await;

        let seeds = vec!["Ghost Paper".to_string()];
        let found = crawler(&server)
            .crawl_one_hop(&seeds, None, &KeywordExpr::Any)
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
