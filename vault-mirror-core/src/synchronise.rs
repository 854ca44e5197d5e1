//! High-level pipeline: orchestrates reconcile → fetch/transform → publish
//! for one synchronisation run.
//!
//! A run lists the remote tree once, splits it into article and image
//! entries, reconciles each against the last-published manifest, pushes every
//! `to_fetch` entry through the content pipeline on a bounded-concurrency
//! pool, and hands the surviving entry sets to the publisher.
//!
//! # Major Types
//! - [`SyncReport`]: per-entity counts of what the run did
//! - [`SyncError`]: the only failures fatal to a run (tree listing, publish)
//!
//! # Responsibilities
//! - Per-file isolation: a single file's fetch/transform failure is logged,
//!   counted and skipped; the run continues and the file is retried next run
//! - Write-before-publish ordering: entry content is persisted by the
//!   pipeline before the entry can appear in a published manifest
//! - Invokes logging throughout for traceability (see tracing events)
//!
//! # Callable From
//! - Used by both the CLI crate and integration tests, against any
//!   [`RemoteRepository`] + [`ContentStore`] implementation
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]

use std::sync::LazyLock;

use futures::stream::{self, StreamExt};
use regex::Regex;
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::contract::{
    ContentStore, EntryKind, RemoteError, RemoteRepository, StoreError, TreeEntry,
};
use crate::manifest::{
    ArticleInfo, ArticleManifest, ImageInfo, ImageManifest, ARTICLE_MANIFEST_KEY,
    IMAGE_MANIFEST_KEY,
};
use crate::pipeline;
use crate::publish::Publisher;
use crate::reconcile::reconcile;

/// Counts for one entity type (articles or images) in a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityReport {
    /// Entries in the newly published manifest.
    pub total: usize,
    /// Entries carried forward without a re-fetch.
    pub unchanged: usize,
    /// Entries fetched, transformed and persisted this run.
    pub fetched: usize,
    /// Entries pruned from the manifest and store.
    pub deleted: usize,
    /// Entries that failed fetch/transform and were skipped.
    pub failed: usize,
}

/// Output report of a full synchronisation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub articles: EntityReport,
    pub images: EntityReport,
}

/// Failures fatal to a whole run. Per-file failures never surface here.
#[derive(Debug)]
pub enum SyncError {
    ListTree(RemoteError),
    Publish(StoreError),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::ListTree(e) => write!(f, "failed to list remote tree: {e}"),
            SyncError::Publish(e) => write!(f, "failed to publish manifest: {e}"),
        }
    }
}

impl std::error::Error for SyncError {}

static IMAGE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(png|jpe?g|gif|bmp|svg|webp)$").unwrap());

fn is_article(config: &SyncConfig, entry: &TreeEntry) -> bool {
    entry.kind == EntryKind::Blob
        && entry.path.starts_with(&format!("{}/", config.article_dir))
        && entry.path.to_ascii_lowercase().ends_with(".md")
}

fn is_image(config: &SyncConfig, entry: &TreeEntry) -> bool {
    entry.kind == EntryKind::Blob
        && entry
            .path
            .starts_with(&format!("{}/", config.attachment_dir))
        && IMAGE_EXTENSION.is_match(&entry.path)
}

/// Entrypoint: run one full synchronisation pass against the remote.
pub async fn synchronise<R, S>(
    config: &SyncConfig,
    remote: &R,
    store: &S,
    publisher: &Publisher,
) -> Result<SyncReport, SyncError>
where
    R: RemoteRepository + ?Sized,
    S: ContentStore + ?Sized,
{
    info!(reference = %config.reference, "[SYNC] Starting full synchronisation run");

    let tree = match remote.list_tree(&config.reference).await {
        Ok(tree) => {
            info!(entries = tree.len(), "[SYNC] Listed remote tree");
            tree
        }
        Err(e) => {
            error!(error = ?e, reference = %config.reference, "[SYNC][ERROR] Failed to list remote tree");
            return Err(SyncError::ListTree(e));
        }
    };

    let article_entries: Vec<TreeEntry> = tree
        .iter()
        .filter(|e| is_article(config, e))
        .cloned()
        .collect();
    let image_entries: Vec<TreeEntry> = tree
        .iter()
        .filter(|e| is_image(config, e))
        .cloned()
        .collect();
    info!(
        articles = article_entries.len(),
        images = image_entries.len(),
        "[SYNC] Split remote tree into entity sets"
    );

    let articles = sync_articles(config, remote, store, publisher, article_entries).await?;
    let images = sync_images(config, remote, store, publisher, image_entries).await?;

    let report = SyncReport { articles, images };
    info!(?report, "[SYNC] Synchronisation run complete");
    Ok(report)
}

async fn sync_articles<R, S>(
    config: &SyncConfig,
    remote: &R,
    store: &S,
    publisher: &Publisher,
    remote_entries: Vec<TreeEntry>,
) -> Result<EntityReport, SyncError>
where
    R: RemoteRepository + ?Sized,
    S: ContentStore + ?Sized,
{
    let previous = load_previous_articles(store).await;
    let plan = reconcile(&remote_entries, &previous.articles);
    info!(
        unchanged = plan.unchanged.len(),
        to_fetch = plan.to_fetch.len(),
        to_delete = plan.to_delete.len(),
        "[SYNC] Reconciled articles"
    );

    let attempted = plan.to_fetch.len();
    let fetched: Vec<ArticleInfo> = stream::iter(plan.to_fetch.iter())
        .map(|entry| async move {
            match pipeline::process_article(remote, store, config.processor, entry).await {
                Ok(info) => {
                    info!(path = %entry.path, slug = %info.slug, "[SYNC] Fetched and processed article");
                    Some(info)
                }
                Err(e) => {
                    error!(path = %entry.path, error = ?e, "[SYNC][ERROR] Failed to process article, skipping");
                    None
                }
            }
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    let mut report = EntityReport {
        unchanged: plan.unchanged.len(),
        fetched: fetched.len(),
        deleted: plan.to_delete.len(),
        failed: attempted - fetched.len(),
        ..EntityReport::default()
    };

    let mut articles = plan.unchanged.clone();
    articles.extend(fetched);
    // The fetch pool completes out of order; sorting keeps published
    // manifests deterministic across runs.
    articles.sort_by(|a, b| a.source_path.cmp(&b.source_path));

    let manifest = publisher
        .publish_articles(store, articles, &plan.to_delete)
        .await
        .map_err(SyncError::Publish)?;
    report.total = manifest.articles.len();
    Ok(report)
}

async fn sync_images<R, S>(
    config: &SyncConfig,
    remote: &R,
    store: &S,
    publisher: &Publisher,
    remote_entries: Vec<TreeEntry>,
) -> Result<EntityReport, SyncError>
where
    R: RemoteRepository + ?Sized,
    S: ContentStore + ?Sized,
{
    let previous = load_previous_images(store).await;
    let plan = reconcile(&remote_entries, &previous.images);
    info!(
        unchanged = plan.unchanged.len(),
        to_fetch = plan.to_fetch.len(),
        to_delete = plan.to_delete.len(),
        "[SYNC] Reconciled images"
    );

    let attempted = plan.to_fetch.len();
    let fetched: Vec<ImageInfo> = stream::iter(plan.to_fetch.iter())
        .map(|entry| async move {
            match pipeline::process_image(remote, store, entry).await {
                Ok(info) => {
                    info!(path = %entry.path, name = %info.name, "[SYNC] Fetched image");
                    Some(info)
                }
                Err(e) => {
                    error!(path = %entry.path, error = ?e, "[SYNC][ERROR] Failed to fetch image, skipping");
                    None
                }
            }
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    let mut report = EntityReport {
        unchanged: plan.unchanged.len(),
        fetched: fetched.len(),
        deleted: plan.to_delete.len(),
        failed: attempted - fetched.len(),
        ..EntityReport::default()
    };

    let mut images = plan.unchanged.clone();
    images.extend(fetched);
    images.sort_by(|a, b| a.source_path.cmp(&b.source_path));

    let manifest = publisher
        .publish_images(store, images, &plan.to_delete)
        .await
        .map_err(SyncError::Publish)?;
    report.total = manifest.images.len();
    Ok(report)
}

/// Load the previous article manifest for reconciliation. A missing manifest
/// is the first-run case; a malformed one is logged and rebuilt from scratch.
async fn load_previous_articles<S>(store: &S) -> ArticleManifest
where
    S: ContentStore + ?Sized,
{
    match store.get(ARTICLE_MANIFEST_KEY).await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "[SYNC] Stored article manifest is malformed, rebuilding from scratch");
                ArticleManifest::empty()
            }
        },
        Ok(None) => {
            info!("[SYNC] No article manifest found, starting from an empty one");
            ArticleManifest::empty()
        }
        Err(e) => {
            warn!(error = ?e, "[SYNC] Failed to read article manifest, starting from an empty one");
            ArticleManifest::empty()
        }
    }
}

async fn load_previous_images<S>(store: &S) -> ImageManifest
where
    S: ContentStore + ?Sized,
{
    match store.get(IMAGE_MANIFEST_KEY).await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "[SYNC] Stored image manifest is malformed, rebuilding from scratch");
                ImageManifest::empty()
            }
        },
        Ok(None) => {
            info!("[SYNC] No image manifest found, starting from an empty one");
            ImageManifest::empty()
        }
        Err(e) => {
            warn!(error = ?e, "[SYNC] Failed to read image manifest, starting from an empty one");
            ImageManifest::empty()
        }
    }
}
