//! Bulk PDF download for resolved records.

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{LitrevError, Result};
use crate::http::{HttpClient, USER_AGENT};
use crate::record::PaperRecord;
use crate::retry::RetryPolicy;

pub struct PdfDownloader {
    http: HttpClient,
    retry: RetryPolicy,
}

impl PdfDownloader {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            http: HttpClient::new(Duration::from_secs(1), USER_AGENT),
            retry,
        }
    }

    /// Fetch each record's `url` into `dir` as `{cite_key}.pdf`. Records
    /// without a url or cite key are skipped with a warning, as are
    /// download failures; one bad paper never aborts the batch.
    pub async fn download_all(&self, records: &[PaperRecord], dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            return Err(LitrevError::InvalidPath(dir.display().to_string()));
        }

        let mut written = 0;
        for record in records {
            let label = record
                .title()
                .or(record.cite_key.as_deref())
                .unwrap_or("<untitled>");
            let Some(url) = record.url() else {
                warn!("no url for '{label}', skipping");
                continue;
            };
            let Some(key) = record.cite_key.as_deref() else {
                warn!("no cite key for '{label}', skipping");
                continue;
            };
            let bytes = match self
                .retry
                .run("pdf download", || self.http.get_bytes(url))
                .await
            {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("download of '{label}' failed: {e}");
                    continue;
                }
            };
            let path = dir.join(format!("{key}.pdf"));
            std::fs::write(&path, bytes)?;
            info!("wrote {}", path.display());
            written += 1;
        }
        Ok(written)
    }
}
