//! Cached entry metadata and the manifests that index it.
//!
//! A manifest is the authoritative, atomically-replaced index of all currently
//! cached entries for one content type. Exactly one manifest per type is
//! current at any time; it is only ever replaced wholesale by the publisher,
//! never edited in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Well-known store key for the article manifest.
pub const ARTICLE_MANIFEST_KEY: &str = "article:manifest";

/// Well-known store key for the image manifest.
pub const IMAGE_MANIFEST_KEY: &str = "image:manifest";

/// Store key for a cached article body, keyed by content hash.
pub fn article_content_key(content_hash: &str) -> String {
    format!("article:content:{content_hash}")
}

/// Store key for cached image bytes, keyed by the sanitized filename the
/// rewritten markdown links point at.
pub fn image_content_key(name: &str) -> String {
    format!("image:content:{name}")
}

/// Metadata for one synced article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleInfo {
    /// Display title: the frontmatter title when present, the file stem otherwise.
    pub name: String,
    /// Stable, URL-safe lookup key derived from the source path.
    pub slug: String,
    /// Identifies the exact byte content; cache key and change-detection token.
    pub content_hash: String,
    /// Path of the source file in the remote repository.
    pub source_path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Hidden articles stay in the manifest but are excluded from listings.
    #[serde(default)]
    pub hidden: bool,
}

/// Metadata for one synced image attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Sanitized filename; also the content key the image is served under.
    pub name: String,
    pub content_hash: String,
    pub source_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleManifest {
    pub articles: Vec<ArticleInfo>,
    pub last_update: DateTime<Utc>,
}

impl ArticleManifest {
    pub fn empty() -> Self {
        Self {
            articles: Vec::new(),
            last_update: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageManifest {
    pub images: Vec<ImageInfo>,
    pub last_update: DateTime<Utc>,
}

impl ImageManifest {
    pub fn empty() -> Self {
        Self {
            images: Vec::new(),
            last_update: Utc::now(),
        }
    }
}

/// Content-hash identity, shared by articles and images so the reconciler can
/// classify both with the same logic.
pub trait Hashed {
    fn content_hash(&self) -> &str;
}

impl Hashed for ArticleInfo {
    fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

impl Hashed for ImageInfo {
    fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

/// Sort order for article listings, always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    #[default]
    Created,
    Updated,
}

impl From<&str> for ListOrder {
    fn from(s: &str) -> Self {
        match s {
            "created" | "createdAt" | "created_at" => ListOrder::Created,
            "updated" | "updatedAt" | "updated_at" => ListOrder::Updated,
            other => {
                warn!(order = other, "Unknown list order, defaulting to created");
                ListOrder::Created
            }
        }
    }
}

/// Read-path filtering and sorting over manifest entries. Never consulted by
/// the reconciler; this is what listing endpoints apply before responding.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    /// Case-insensitive exact match on the article category.
    pub category: Option<String>,
    /// Case-insensitive exact match against the article's tags.
    pub tag: Option<String>,
    pub order: ListOrder,
}

impl ArticleQuery {
    /// Apply the query: drop hidden entries, filter, sort descending.
    /// Entries lacking the sort timestamp order last.
    pub fn apply(&self, articles: &[ArticleInfo]) -> Vec<ArticleInfo> {
        let mut selected: Vec<ArticleInfo> = articles
            .iter()
            .filter(|a| !a.hidden)
            .filter(|a| match &self.category {
                Some(wanted) => a
                    .category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
                None => true,
            })
            .filter(|a| match &self.tag {
                Some(wanted) => a.tags.iter().any(|t| t.eq_ignore_ascii_case(wanted)),
                None => true,
            })
            .cloned()
            .collect();

        // Descending; Option ordering puts None-timestamped entries last.
        match self.order {
            ListOrder::Created => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ListOrder::Updated => selected.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        }
        selected
    }
}
