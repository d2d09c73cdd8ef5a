//! Semantic Scholar Graph API adapter: title search, batched citation
//! formatting, and the paginated citation-graph endpoints.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};

use crate::bibtex;
use crate::error::{LitrevError, Result};
use crate::http::{HttpClient, USER_AGENT};
use crate::record::{PaperRecord, clean_field_text};
use crate::retry::RetryPolicy;
use crate::sources::PaperSource;

const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";
const SEARCH_FIELDS: &str = "paperId,title,abstract,year,citationCount,publicationDate";
const BATCH_FIELDS: &str = "citationStyles,openAccessPdf,abstract";
const NEIGHBOR_FIELDS: &str = "title,abstract";
const PAGE_LIMIT: u32 = 100;
const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct S2PaperId(String);

impl S2PaperId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for S2PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Search-level view of a paper: enough for title validation and for
/// citation statistics without a second round-trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct S2Paper {
    pub paper_id: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub year: Option<i32>,
    pub citation_count: Option<u32>,
    /// `YYYY-MM-DD`, as the API reports it.
    pub publication_date: Option<String>,
}

impl S2Paper {
    pub fn from_json(v: &Value) -> Self {
        Self {
            paper_id: str_field(v, "paperId").unwrap_or_default(),
            title: str_field(v, "title").unwrap_or_default(),
            abstract_text: str_field(v, "abstract"),
            year: v
                .get("year")
                .and_then(Value::as_i64)
                .and_then(|n| i32::try_from(n).ok()),
            citation_count: v
                .get("citationCount")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok()),
            publication_date: str_field(v, "publicationDate"),
        }
    }

    pub fn id(&self) -> S2PaperId {
        S2PaperId::new(&self.paper_id)
    }
}

/// A neighbor in the citation graph (a citing or cited paper).
#[derive(Debug, Clone, PartialEq)]
pub struct S2Neighbor {
    pub title: String,
    pub abstract_text: Option<String>,
}

/// The fields the batch endpoint returns for record construction.
#[derive(Debug, Clone)]
pub struct S2CitationFields {
    pub bibtex: String,
    pub abstract_text: Option<String>,
    pub open_access_url: Option<String>,
}

pub struct SemanticScholarSource {
    http: HttpClient,
    retry: RetryPolicy,
    api_key: Option<String>,
    base_url: String,
}

impl SemanticScholarSource {
    pub fn new(api_key: Option<String>, retry: RetryPolicy) -> Self {
        Self::with_base_url(BASE_URL, api_key, retry)
    }

    pub fn with_base_url(base_url: &str, api_key: Option<String>, retry: RetryPolicy) -> Self {
        let min_interval = if api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(1)
        };
        Self {
            http: HttpClient::new(min_interval, USER_AGENT),
            retry,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let value =
                HeaderValue::from_str(key).map_err(|e| LitrevError::Parse(e.to_string()))?;
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(headers)
    }

    /// Title search, limit 1.
    pub async fn search_one(&self, title: &str) -> Result<Option<S2Paper>> {
        let url = format!(
            "{}/paper/search?query={}&limit=1&fields={SEARCH_FIELDS}",
            self.base_url,
            urlencoding::encode(title)
        );
        let body: Value = self
            .retry
            .run("semantic scholar search", || async {
                self.http
                    .get_json_with_headers(&url, self.auth_headers()?)
                    .await
            })
            .await?;

        Ok(body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .map(S2Paper::from_json)
            .filter(|paper| !paper.paper_id.is_empty()))
    }

    /// One batched call for citation style, abstract and open-access PDF.
    /// An empty batch response is an error: the id was supposed to exist.
    pub async fn citation_fields(&self, id: &S2PaperId) -> Result<S2CitationFields> {
        let url = format!("{}/paper/batch?fields={BATCH_FIELDS}", self.base_url);
        let payload = json!({ "ids": [id.as_str()] });
        let response: Value = self
            .retry
            .run("semantic scholar batch", || async {
                self.http
                    .post_json(&url, &payload, self.auth_headers()?)
                    .await
            })
            .await?;

        let entry = response
            .as_array()
            .and_then(|items| items.first())
            .filter(|item| !item.is_null())
            .ok_or_else(|| {
                LitrevError::Api(url.clone(), "empty batch response".to_string())
            })?;

        let bibtex = entry
            .get("citationStyles")
            .and_then(|styles| styles.get("bibtex"))
            .and_then(Value::as_str)
            .map(|s| s.trim_matches(['\n', ' ']).to_string())
            .ok_or_else(|| LitrevError::Parse("batch response without bibtex".to_string()))?;

        Ok(S2CitationFields {
            bibtex,
            abstract_text: str_field(entry, "abstract"),
            open_access_url: entry
                .get("openAccessPdf")
                .and_then(|pdf| pdf.get("url"))
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
        })
    }

    /// Build the canonical record for an already-resolved paper handle.
    pub async fn record_for(&self, paper: &S2Paper) -> Result<PaperRecord> {
        let fields = self.citation_fields(&paper.id()).await?;
        let mut record = bibtex::parse_one(&fields.bibtex)?;
        if let Some(text) = &fields.abstract_text {
            record.set("abstract", clean_field_text(text));
        }
        if let Some(url) = &fields.open_access_url {
            record.set("url", url.clone());
        }
        Ok(record)
    }

    /// Papers citing `id`.
    pub async fn citations(&self, id: &S2PaperId) -> Result<Vec<S2Neighbor>> {
        self.neighbors(id, "citations", "citingPaper").await
    }

    /// Papers `id` cites.
    pub async fn references(&self, id: &S2PaperId) -> Result<Vec<S2Neighbor>> {
        self.neighbors(id, "references", "citedPaper").await
    }

    /// Consume a paginated graph endpoint until the API stops returning a
    /// `next` offset. Every page fetch goes through the retry policy.
    async fn neighbors(
        &self,
        id: &S2PaperId,
        endpoint: &str,
        wrapper_key: &str,
    ) -> Result<Vec<S2Neighbor>> {
        let mut out = Vec::new();
        let mut offset: u64 = 0;
        loop {
            let url = format!(
                "{}/paper/{}/{endpoint}?fields={NEIGHBOR_FIELDS}&offset={offset}&limit={PAGE_LIMIT}",
                self.base_url,
                id.as_str()
            );
            let page: Value = self
                .retry
                .run("semantic scholar graph page", || async {
                    self.http
                        .get_json_with_headers(&url, self.auth_headers()?)
                        .await
                })
                .await?;

            if let Some(items) = page.get("data").and_then(Value::as_array) {
                for item in items {
                    let neighbor = item.get(wrapper_key).unwrap_or(item);
                    if let Some(title) = str_field(neighbor, "title") {
                        out.push(S2Neighbor {
                            title,
                            abstract_text: str_field(neighbor, "abstract"),
                        });
                    }
                }
            }

            match page.get("next").and_then(Value::as_u64) {
                Some(next) => offset = next,
                None => break,
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl PaperSource for SemanticScholarSource {
    fn name(&self) -> &'static str {
        "semanticscholar"
    }

    async fn fetch(&self, title: &str) -> Result<Option<PaperRecord>> {
        let Some(paper) = self.search_one(title).await? else {
            return Ok(None);
        };
        Ok(Some(self.record_for(&paper).await?))
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}
