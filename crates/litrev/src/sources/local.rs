//! Local archive of previously collected bibliography files. No network.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::bibtex;
use crate::error::Result;
use crate::record::PaperRecord;
use crate::sources::PaperSource;
use crate::title::TitleKey;

pub struct LocalArchiveSource {
    root: PathBuf,
}

impl LocalArchiveSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Parse every `*.bib` file under the root (recursive) and index the
    /// records by normalized title. Later files win on key collisions.
    pub fn load_index(&self) -> Result<HashMap<TitleKey, PaperRecord>> {
        let mut index = HashMap::new();
        if !self.root.exists() {
            debug!("archive root {} does not exist", self.root.display());
            return Ok(index);
        }

        let mut files = Vec::new();
        collect_bib_files(&self.root, &mut files)?;
        for path in files {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("could not read {}: {e}", path.display());
                    continue;
                }
            };
            match bibtex::parse(&text) {
                Ok(records) => {
                    for record in records {
                        match record.title() {
                            Some(title) => {
                                index.insert(TitleKey::new(title), record);
                            }
                            None => warn!(
                                "entry without title in {}, skipping",
                                path.display()
                            ),
                        }
                    }
                }
                Err(e) => warn!("could not parse {}: {e}", path.display()),
            }
        }
        Ok(index)
    }
}

fn collect_bib_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_bib_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "bib") {
            out.push(path);
        }
    }
    Ok(())
}

#[async_trait]
impl PaperSource for LocalArchiveSource {
    fn name(&self) -> &'static str {
        "own"
    }

    async fn fetch(&self, title: &str) -> Result<Option<PaperRecord>> {
        let mut index = self.load_index()?;
        Ok(index.remove(&TitleKey::new(title)))
    }
}
