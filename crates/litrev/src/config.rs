use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LitrevError, Result};
use crate::retry::{DEFAULT_TRIALS, DEFAULT_WAIT, RetryPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LitrevConfig {
    /// Root folder of the local bibliography archive (`*.bib` files).
    pub archive_dir: Option<PathBuf>,
    /// API key for the scraping proxy used by the scholarly collaborator.
    pub scraper_api_key: Option<String>,
    pub semantic_scholar_api_key: Option<String>,
    pub arxiv_categories: Vec<String>,
    pub arxiv_max_results: u32,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub trials: u32,
    pub wait_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            wait_secs: DEFAULT_WAIT.as_secs(),
        }
    }
}

impl Default for LitrevConfig {
    fn default() -> Self {
        Self {
            archive_dir: None,
            scraper_api_key: None,
            semantic_scholar_api_key: None,
            arxiv_categories: ["cs.LG", "stat.ML", "stat.ME", "math.ST", "econ.EM", "stat.AP"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            arxiv_max_results: 10_000,
            retry: RetryConfig::default(),
        }
    }
}

impl LitrevConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| LitrevError::Parse(e.to_string()))
    }

    /// `~/.config/litrev/config.toml` (platform equivalent), if resolvable.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("litrev").join("config.toml"))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.trials, Duration::from_secs(self.retry.wait_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_expected_categories() {
        let config = LitrevConfig::default();
        assert_eq!(config.arxiv_categories[0], "cs.LG");
        assert_eq!(config.arxiv_max_results, 10_000);
        assert_eq!(config.retry.trials, 100);
        assert_eq!(config.retry.wait_secs, 10);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let parsed: LitrevConfig = toml::from_str(
            r#"
            archive_dir = "/tmp/bibs"

            [retry]
            trials = 5
            "#,
        )
        .unwrap();
        assert_eq!(parsed.archive_dir.as_deref(), Some(Path::new("/tmp/bibs")));
        assert_eq!(parsed.retry.trials, 5);
        assert_eq!(parsed.retry.wait_secs, 10);
        assert_eq!(parsed.arxiv_categories.len(), 6);
    }
}
