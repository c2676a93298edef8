// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Raw feed entry before classification. `url` is the identity key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleCandidate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    /// ISO code or best-effort guess; may be missing or wrong.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub published_at: u64, // unix seconds, 0 when unknown
}

impl ArticleCandidate {
    /// Title and description joined for scanning. Empty parts are skipped.
    pub fn combined_text(&self) -> String {
        [self.title.trim(), self.description.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Name of the first required field that is empty/whitespace, if any.
    /// The url is always required; the title only when `require_title` is set.
    pub fn missing_required_field(&self, require_title: bool) -> Option<&'static str> {
        if self.url.trim().is_empty() {
            return Some("url");
        }
        if require_title && self.title.trim().is_empty() {
            return Some("title");
        }
        None
    }
}

/// What the persistence collaborator receives for an admitted candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdmittedArticle {
    /// Short stable fingerprint of the url.
    pub id: String,
    pub candidate: ArticleCandidate,
    pub category: Category,
    pub relevance_score: f32,
}

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<ArticleCandidate>>;
    fn name(&self) -> &str;
}

/// Persistence seam. Rejected candidates never reach it.
#[async_trait::async_trait]
pub trait ArticleSink: Send + Sync {
    async fn store(&self, article: AdmittedArticle) -> Result<()>;
}
