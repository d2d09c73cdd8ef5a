use std::time::Duration;

use chrono::NaiveDate;

use crate::arxiv::parser::parse_atom_response;
use crate::arxiv::types::{ArxivEntry, ArxivId};
use crate::error::{LitrevError, Result};
use crate::http::{HttpClient, USER_AGENT};

const QUERY_URL: &str = "http://export.arxiv.org/api/query";
const BIBTEX_URL: &str = "https://arxiv.org/bibtex";

pub struct ArxivClient {
    http: HttpClient,
    query_url: String,
    bibtex_url: String,
}

impl ArxivClient {
    pub fn new() -> Self {
        Self::with_base_urls(QUERY_URL, BIBTEX_URL)
    }

    pub fn with_base_urls(query_url: &str, bibtex_url: &str) -> Self {
        Self {
            http: HttpClient::new(Duration::from_secs(3), USER_AGENT),
            query_url: query_url.to_string(),
            bibtex_url: bibtex_url.trim_end_matches('/').to_string(),
        }
    }

    /// Exact-quoted title search, newest submission first, single result.
    pub async fn search_exact(&self, title: &str) -> Result<Option<ArxivEntry>> {
        let query = urlencoding::encode(&format!("\"{title}\"")).into_owned();
        let url = format!(
            "{}?search_query={query}&sortBy=submittedDate&sortOrder=descending&start=0&max_results=1",
            self.query_url
        );
        let xml = self.http.get(&url).await?;
        Ok(parse_atom_response(&xml)?.into_iter().next())
    }

    pub async fn fetch_by_id(&self, id: &ArxivId) -> Result<Option<ArxivEntry>> {
        let url = format!("{}?id_list={}&max_results=1", self.query_url, id.id);
        let xml = self.http.get(&url).await?;
        Ok(parse_atom_response(&xml)?.into_iter().next())
    }

    /// The site's own citation for an entry, as BibTeX text.
    pub async fn bibtex(&self, id: &ArxivId) -> Result<String> {
        self.http.get(&format!("{}/{}", self.bibtex_url, id.id)).await
    }

    /// Every entry in the given categories whose `lastUpdatedDate` falls in
    /// `[start 00:00, end 23:59]`, sorted ascending by update time. Errors
    /// when the response fills the cap, since entries would be missing.
    pub async fn list_window(
        &self,
        categories: &[String],
        start: NaiveDate,
        end: NaiveDate,
        max_results: u32,
    ) -> Result<Vec<ArxivEntry>> {
        let cats = categories
            .iter()
            .map(|c| format!("cat:{c}"))
            .collect::<Vec<_>>()
            .join("+OR+");
        let range = format!(
            "lastUpdatedDate:[{}0000+TO+{}2359]",
            start.format("%Y%m%d"),
            end.format("%Y%m%d")
        );
        let url = format!(
            "{}?search_query=%28{cats}%29+AND+{range}&start=0&max_results={max_results}",
            self.query_url
        );

        let xml = self.http.get(&url).await?;
        let mut entries = parse_atom_response(&xml)?;
        if entries.len() as u32 >= max_results {
            return Err(LitrevError::Api(
                url,
                format!("window returned {} entries, hitting the cap; narrow the date range", entries.len()),
            ));
        }
        entries.sort_by_key(|entry| entry.updated);
        Ok(entries)
    }
}

impl Default for ArxivClient {
    fn default() -> Self {
        Self::new()
    }
}
