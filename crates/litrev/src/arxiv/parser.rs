use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::arxiv::types::{ArxivEntry, ArxivId};
use crate::error::{LitrevError, Result};
use crate::record::clean_field_text;

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    title: String,
    summary: String,
    published: String,
    updated: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@type")]
    link_type: Option<String>,
}

pub fn parse_atom_response(xml: &str) -> Result<Vec<ArxivEntry>> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| LitrevError::Parse(format!("invalid atom xml: {e}")))?;

    feed.entries.into_iter().map(parse_entry).collect()
}

fn parse_entry(entry: AtomEntry) -> Result<ArxivEntry> {
    let id = ArxivId::parse(entry.id.trim())
        .map_err(|_| LitrevError::Parse(format!("invalid arXiv id in entry: {}", entry.id)))?;

    let pdf_url = entry
        .links
        .iter()
        .find(|link| link.link_type.as_deref() == Some("application/pdf"))
        .and_then(|link| link.href.as_ref())
        .map(|url| normalize_arxiv_url(url))
        .unwrap_or_else(|| id.pdf_url.clone());

    Ok(ArxivEntry {
        title: clean_field_text(&entry.title),
        summary: clean_field_text(&entry.summary),
        published: parse_rfc3339(&entry.published, "published")?,
        updated: parse_rfc3339(&entry.updated, "updated")?,
        authors: entry
            .authors
            .into_iter()
            .map(|author| clean_field_text(&author.name))
            .collect(),
        pdf_url,
        id,
    })
}

fn parse_rfc3339(value: &str, field_name: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LitrevError::Parse(format!("invalid {field_name} datetime: {e}")))
}

fn normalize_arxiv_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("http://arxiv.org/") {
        return format!("https://arxiv.org/{rest}");
    }
    url.to_string()
}
