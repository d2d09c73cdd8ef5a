//! arXiv adapter: native search first, site-scoped web search as fallback.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::arxiv::client::ArxivClient;
use crate::arxiv::types::{ArxivEntry, ArxivId};
use crate::bibtex;
use crate::error::Result;
use crate::record::{PaperRecord, clean_field_text};
use crate::retry::RetryPolicy;
use crate::sources::{PaperSource, WebSearch};
use crate::title::titles_match;

pub struct ArxivSource {
    client: ArxivClient,
    retry: RetryPolicy,
    web: Option<Arc<dyn WebSearch>>,
}

impl ArxivSource {
    pub fn new(client: ArxivClient, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            web: None,
        }
    }

    pub fn with_web_search(mut self, web: Arc<dyn WebSearch>) -> Self {
        self.web = Some(web);
        self
    }

    /// Find the arXiv entry for a title. The exact-quoted search result is
    /// kept only when its title matches; otherwise a `site:arxiv.org` web
    /// search recovers an identifier, whose entry is returned unchecked
    /// (the resolver re-validates).
    pub async fn locate(&self, title: &str) -> Result<Option<ArxivEntry>> {
        let hit = self
            .retry
            .run("arxiv search", || self.client.search_exact(title))
            .await?;
        if let Some(entry) = hit {
            if titles_match(title, &entry.title) {
                return Ok(Some(entry));
            }
            debug!("arxiv search returned '{}', not a match", entry.title);
        }

        let Some(web) = &self.web else {
            return Ok(None);
        };
        let query = format!("{title} site:arxiv.org");
        let Some(url) = web.first_hit(&query).await? else {
            return Ok(None);
        };
        let raw = url.rsplit('/').next().unwrap_or(&url);
        let id = match ArxivId::parse(raw) {
            Ok(id) => id,
            Err(e) => {
                warn!("web search hit '{url}' is not an arXiv page: {e}");
                return Ok(None);
            }
        };
        self.retry
            .run("arxiv id fetch", || self.client.fetch_by_id(&id))
            .await
    }
}

#[async_trait]
impl PaperSource for ArxivSource {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    async fn fetch(&self, title: &str) -> Result<Option<PaperRecord>> {
        let Some(entry) = self.locate(title).await? else {
            return Ok(None);
        };
        let bib = self
            .retry
            .run("arxiv bibtex", || self.client.bibtex(&entry.id))
            .await?;
        let mut record = bibtex::parse_one(&bib)?;
        record.set("abstract", clean_field_text(&entry.summary));
        record.set("url", entry.pdf_url.clone());
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::{Matcher, Server};

    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/1706.03762v5</id>
    <updated>2023-08-02T03:09:44Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All You Need</title>
    <summary>The dominant sequence
transduction models.</summary>
    <author><name>Ashish Vaswani</name></author>
    <link title="pdf" rel="related" type="application/pdf" href="http://arxiv.org/pdf/1706.03762v5" />
  </entry>
</feed>"#;

    const EMPTY_FEED: &str =
        r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"></feed>"#;

    const BIB: &str = r#"@misc{vaswani2017attention,
  title = {Attention Is All You Need},
  author = {Vaswani, Ashish},
  year = {2017},
}"#;

    fn source(server: &Server) -> ArxivSource {
        ArxivSource::new(
            ArxivClient::with_base_urls(
                &format!("{}/query", server.url()),
                &format!("{}/bibtex", server.url()),
            ),
            RetryPolicy::new(2, Duration::from_millis(1)),
        )
    }

    struct FixedHit(Option<String>);

    #[async_trait]
    impl WebSearch for FixedHit {
        async fn first_hit(&self, _query: &str) -> Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn builds_record_from_site_bibtex_with_abstract_and_url() {
        let mut server = Server::new_async().await;
        let _q = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_body(FEED)
            .create_async()
            .await;
        let _b = server
            .mock("GET", "/bibtex/1706.03762")
            .with_body(BIB)
            .create_async()
            .await;

        let record = source(&server)
            .fetch("Attention Is All You Need")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.cite_key.as_deref(), Some("vaswani2017attention"));
        assert_eq!(
            record.get("abstract"),
            Some("The dominant sequence transduction models.")
        );
        assert_eq!(record.url(), Some("https://arxiv.org/pdf/1706.03762v5"));
    }

    #[tokio::test]
    async fn no_match_without_web_search_returns_none() {
        let mut server = Server::new_async().await;
        let _q = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_body(EMPTY_FEED)
            .create_async()
            .await;

        let result = source(&server).fetch("Some Unknown Paper").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn web_search_fallback_recovers_identifier() {
        let mut server = Server::new_async().await;
        // Native search misses, id_list fetch succeeds.
        let _miss = server
            .mock("GET", "/query")
            .match_query(Matcher::Regex("search_query".to_string()))
            .with_body(EMPTY_FEED)
            .create_async()
            .await;
        let _id = server
            .mock("GET", "/query")
            .match_query(Matcher::Regex("id_list=1706.03762".to_string()))
            .with_body(FEED)
            .create_async()
            .await;

        let web = Arc::new(FixedHit(Some(
            "https://arxiv.org/abs/1706.03762".to_string(),
        )));
        let located = source(&server)
            .with_web_search(web)
            .locate("Attention Is Everything You Want")
            .await
            .unwrap();
        assert_eq!(located.unwrap().id.id, "1706.03762");
    }
}
