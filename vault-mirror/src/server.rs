//! Read API over the cached manifests and content.
//!
//! Strictly read-only: every handler resolves through the injected
//! [`ContentStore`] and never writes. A missing or malformed manifest is a
//! 500 (requires a fresh sync to heal), an unknown slug or image name is an
//! expected 404, and content referenced by the manifest but absent from the
//! store is a 500 (the write-before-publish invariant was violated or the
//! store was tampered with).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use vault_mirror_core::contract::ContentStore;
use vault_mirror_core::manifest::{
    article_content_key, image_content_key, ArticleInfo, ArticleManifest, ArticleQuery,
    ListOrder, ARTICLE_MANIFEST_KEY,
};
use vault_mirror_core::pipeline::ProcessorKind;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    /// Pipeline mode the cache was built with; decides the article content type.
    pub processor: ProcessorKind,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/article/list", get(list_articles))
        .route("/article/:slug", get(get_article))
        .route("/image/:name", get(get_image))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Bind and serve the read API until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Read API listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

enum ApiError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::Internal(msg) => {
                error!(message = %msg, "Read API internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
            }
        }
    }
}

async fn load_article_manifest(store: &dyn ContentStore) -> Result<ArticleManifest, ApiError> {
    let bytes = store
        .get(ARTICLE_MANIFEST_KEY)
        .await
        .map_err(|e| ApiError::Internal(format!("store error: {e}")))?
        .ok_or_else(|| ApiError::Internal("article manifest not available".to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Internal(format!("invalid manifest file format: {e}")))
}

async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let manifest = load_article_manifest(state.store.as_ref()).await?;
    let info = manifest
        .articles
        .iter()
        .find(|a| a.slug == slug)
        .ok_or_else(|| ApiError::NotFound(format!("Article '{slug}' not found")))?;

    let content = state
        .store
        .get(&article_content_key(&info.content_hash))
        .await
        .map_err(|e| ApiError::Internal(format!("store error: {e}")))?
        .ok_or_else(|| {
            ApiError::Internal(format!("Cache error, no content for '{}' found", info.name))
        })?;

    let content_type = match state.processor {
        ProcessorKind::Compile => "application/json; charset=utf-8",
        ProcessorKind::Raw => "text/plain; charset=utf-8",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], content).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    category: Option<String>,
    tag: Option<String>,
    order: Option<String>,
}

#[derive(Debug, Serialize)]
struct ArticleList {
    articles: Vec<ArticleInfo>,
    total: usize,
    last_update: DateTime<Utc>,
}

async fn list_articles(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ArticleList>, ApiError> {
    let manifest = load_article_manifest(state.store.as_ref()).await?;
    let query = ArticleQuery {
        category: params.category,
        tag: params.tag,
        order: params
            .order
            .as_deref()
            .map(ListOrder::from)
            .unwrap_or_default(),
    };
    let articles = query.apply(&manifest.articles);
    Ok(Json(ArticleList {
        total: articles.len(),
        articles,
        last_update: manifest.last_update,
    }))
}

async fn get_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state
        .store
        .get(&image_content_key(&name))
        .await
        .map_err(|e| ApiError::Internal(format!("store error: {e}")))?
        .ok_or_else(|| ApiError::NotFound(format!("Image '{name}' not found")))?;

    Ok((
        [(header::CONTENT_TYPE, image_content_type(&name))],
        bytes,
    )
        .into_response())
}

fn image_content_type(name: &str) -> &'static str {
    match name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

async fn healthz() -> &'static str {
    "ok"
}
