//! Scholarly-search adapter. The actual search backend (scraping proxy,
//! API gateway) is an external collaborator behind [`ScholarClient`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::bibtex;
use crate::error::Result;
use crate::record::PaperRecord;
use crate::retry::RetryPolicy;
use crate::sources::PaperSource;

/// A publication as the scholarly backend reports it. `search_single`
/// fills at least the title; `fill` completes citation count and year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScholarPub {
    pub title: String,
    pub num_citations: Option<u32>,
    pub pub_year: Option<String>,
    pub eprint_url: Option<String>,
}

#[async_trait]
pub trait ScholarClient: Send + Sync {
    async fn search_single(&self, title: &str) -> Result<Option<ScholarPub>>;
    async fn fill(&self, publication: &ScholarPub) -> Result<ScholarPub>;
    /// BibTeX citation for a filled publication. The backend names the
    /// year field `pub_year`.
    async fn bibtex(&self, publication: &ScholarPub) -> Result<String>;
}

pub struct GoogleScholarSource {
    client: Arc<dyn ScholarClient>,
    retry: RetryPolicy,
}

impl GoogleScholarSource {
    pub fn new(client: Arc<dyn ScholarClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn client(&self) -> Arc<dyn ScholarClient> {
        Arc::clone(&self.client)
    }
}

#[async_trait]
impl PaperSource for GoogleScholarSource {
    fn name(&self) -> &'static str {
        "googlescholar"
    }

    async fn fetch(&self, title: &str) -> Result<Option<PaperRecord>> {
        let Some(hit) = self
            .retry
            .run("scholar search", || self.client.search_single(title))
            .await?
        else {
            return Ok(None);
        };
        let filled = self
            .retry
            .run("scholar fill", || self.client.fill(&hit))
            .await?;
        let bib = self
            .retry
            .run("scholar bibtex", || self.client.bibtex(&filled))
            .await?
            .replace("pub_year", "year");

        let mut record = bibtex::parse_one(&bib)?;
        if let Some(url) = &filled.eprint_url {
            record.set("url", url.clone());
        }
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    struct StubScholar {
        hit: Option<ScholarPub>,
    }

    #[async_trait]
    impl ScholarClient for StubScholar {
        async fn search_single(&self, _title: &str) -> Result<Option<ScholarPub>> {
            Ok(self.hit.clone())
        }

        async fn fill(&self, publication: &ScholarPub) -> Result<ScholarPub> {
            let mut filled = publication.clone();
            filled.num_citations = Some(42);
            filled.pub_year = Some("2017".to_string());
            Ok(filled)
        }

        async fn bibtex(&self, publication: &ScholarPub) -> Result<String> {
            Ok(format!(
                "@article{{key,\n  title = {{{}}},\n  author = {{Vaswani, Ashish}},\n  pub_year = {{2017}},\n}}",
                publication.title
            ))
        }
    }

    fn source(hit: Option<ScholarPub>) -> GoogleScholarSource {
        GoogleScholarSource::new(
            Arc::new(StubScholar { hit }),
            RetryPolicy::new(2, Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn renames_pub_year_and_attaches_eprint_url() {
        let hit = ScholarPub {
            title: "Attention Is All You Need".to_string(),
            eprint_url: Some("https://example.org/paper.pdf".to_string()),
            ..Default::default()
        };
        let record = source(Some(hit))
            .fetch("Attention Is All You Need")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.year(), Some("2017"));
        assert!(record.get("pub_year").is_none());
        assert_eq!(record.url(), Some("https://example.org/paper.pdf"));
    }

    #[tokio::test]
    async fn no_hit_returns_none() {
        assert!(source(None).fetch("Whatever").await.unwrap().is_none());
    }
}
