//! Literature-review toolkit: resolve paper titles into bibliographic
//! records across arXiv, a local archive, Google Scholar and Semantic
//! Scholar, with deduplication, keyword filtering, citation statistics
//! and one-hop citation-graph crawling on top.

pub mod arxiv;
pub mod bibtex;
pub mod config;
pub mod crawler;
pub mod download;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod http;
pub mod keyword;
pub mod record;
pub mod resolver;
pub mod retry;
pub mod sources;
pub mod title;

pub use config::LitrevConfig;
pub use crawler::CitationGraphCrawler;
pub use enrich::{CitationEnricher, CitationStats};
pub use error::{LitrevError, Result};
pub use keyword::KeywordExpr;
pub use record::PaperRecord;
pub use resolver::{RecordResolver, ResolveOptions};
pub use retry::RetryPolicy;
pub use sources::SourceId;
pub use title::{TitleKey, short_code, titles_match};
