// src/ingest/sink.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::ingest::types::{AdmittedArticle, ArticleSink};

/// Keeps admitted articles in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub items: std::sync::Mutex<Vec<AdmittedArticle>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<AdmittedArticle> {
        self.items.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ArticleSink for MemorySink {
    async fn store(&self, article: AdmittedArticle) -> Result<()> {
        self.items
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink mutex poisoned"))?
            .push(article);
        Ok(())
    }
}

/// Appends one JSON object per admitted article to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl ArticleSink for JsonLinesSink {
    async fn store(&self, article: AdmittedArticle) -> Result<()> {
        let mut line = serde_json::to_string(&article)?;
        line.push('\n');
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        f.write_all(line.as_bytes())
            .await
            .with_context(|| format!("appending to {}", self.path.display()))?;
        Ok(())
    }
}
