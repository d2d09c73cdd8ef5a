//! Source adapters: each external provider normalized behind one trait.

use std::str::FromStr;

use async_trait::async_trait;

use crate::error::{LitrevError, Result};
use crate::record::PaperRecord;

pub mod arxiv;
pub mod local;
pub mod scholar;
pub mod semantic_scholar;

/// One provider of paper metadata. `fetch` returns `Ok(None)` when the
/// provider has no record for the title; errors mean the provider itself
/// failed and the caller should fall through to the next source.
#[async_trait]
pub trait PaperSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, title: &str) -> Result<Option<PaperRecord>>;
}

/// Generic web search capability, used by the arXiv adapter to recover an
/// arXiv identifier when the native search misses. Network implementation
/// lives outside the core.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// URL of the first result for a query, if any.
    async fn first_hit(&self, query: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Arxiv,
    LocalArchive,
    GoogleScholar,
    SemanticScholar,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arxiv => "arxiv",
            Self::LocalArchive => "own",
            Self::GoogleScholar => "googlescholar",
            Self::SemanticScholar => "semanticscholar",
        }
    }
}

impl FromStr for SourceId {
    type Err = LitrevError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "arxiv" => Ok(Self::Arxiv),
            "own" => Ok(Self::LocalArchive),
            "googlescholar" => Ok(Self::GoogleScholar),
            "semanticscholar" => Ok(Self::SemanticScholar),
            other => Err(LitrevError::Parse(format!("unknown source '{other}'"))),
        }
    }
}

/// Resolution order when the caller does not specify one.
pub const DEFAULT_ORDER: [SourceId; 4] = [
    SourceId::Arxiv,
    SourceId::LocalArchive,
    SourceId::GoogleScholar,
    SourceId::SemanticScholar,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_round_trips() {
        for id in DEFAULT_ORDER {
            assert_eq!(id.as_str().parse::<SourceId>().unwrap(), id);
        }
        assert!("nope".parse::<SourceId>().is_err());
    }
}
