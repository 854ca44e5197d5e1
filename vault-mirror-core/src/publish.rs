//! Manifest publication: merge the surviving entry set, prune orphaned
//! content, and replace the manifest under its well-known key.
//!
//! The manifest write is the commit point of a sync run. Everything before it
//! is invisible to readers; a run interrupted earlier leaves the previous
//! manifest fully intact. Orphan pruning is best-effort: a failed removal is
//! logged and the run continues, since a stale blob nothing references is
//! harmless.

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::contract::{ContentStore, StoreError};
use crate::manifest::{
    article_content_key, image_content_key, ArticleInfo, ArticleManifest, ImageInfo,
    ImageManifest, ARTICLE_MANIFEST_KEY, IMAGE_MANIFEST_KEY,
};

/// Serialises manifest commits: only one in-flight manifest write at a time,
/// so two concurrent runs can never interleave partial manifests.
#[derive(Debug, Default)]
pub struct Publisher {
    write_lock: Mutex<()>,
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a new article manifest. Content for every entry must already be
    /// in the store; the pipeline guarantees this for freshly fetched entries
    /// and unchanged entries were published by an earlier run.
    pub async fn publish_articles<S>(
        &self,
        store: &S,
        articles: Vec<ArticleInfo>,
        to_delete: &[ArticleInfo],
    ) -> Result<ArticleManifest, StoreError>
    where
        S: ContentStore + ?Sized,
    {
        let _guard = self.write_lock.lock().await;

        for stale in to_delete {
            let key = article_content_key(&stale.content_hash);
            if let Err(e) = store.remove(&key).await {
                warn!(error = ?e, key = %key, slug = %stale.slug, "Failed to remove stale article content");
            }
        }

        let manifest = ArticleManifest {
            articles,
            last_update: Utc::now(),
        };
        store
            .set(ARTICLE_MANIFEST_KEY, serde_json::to_vec(&manifest)?)
            .await?;
        info!(
            total = manifest.articles.len(),
            pruned = to_delete.len(),
            "Published article manifest"
        );
        Ok(manifest)
    }

    /// Commit a new image manifest; same contract as [`publish_articles`].
    ///
    /// [`publish_articles`]: Publisher::publish_articles
    pub async fn publish_images<S>(
        &self,
        store: &S,
        images: Vec<ImageInfo>,
        to_delete: &[ImageInfo],
    ) -> Result<ImageManifest, StoreError>
    where
        S: ContentStore + ?Sized,
    {
        let _guard = self.write_lock.lock().await;

        for stale in to_delete {
            let key = image_content_key(&stale.name);
            if let Err(e) = store.remove(&key).await {
                warn!(error = ?e, key = %key, name = %stale.name, "Failed to remove stale image content");
            }
        }

        let manifest = ImageManifest {
            images,
            last_update: Utc::now(),
        };
        store
            .set(IMAGE_MANIFEST_KEY, serde_json::to_vec(&manifest)?)
            .await?;
        info!(
            total = manifest.images.len(),
            pruned = to_delete.len(),
            "Published image manifest"
        );
        Ok(manifest)
    }
}
