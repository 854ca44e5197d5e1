#![doc = "GitHub-backed remote repository client: bridges the core's RemoteRepository trait to the GitHub REST API."]
//
//! # GitHub Integration (CLI <-> Core)
//!
//! This module wires up the [`RemoteRepository`] trait for real use against
//! the GitHub REST API: a recursive git tree listing for change detection and
//! raw content fetches for the pipeline.
//!
//! ## Client Usage
//!
//! - Construct [`GitHubClient`] from the remote config section; the API token
//!   is read from the `GITHUB_TOKEN` environment variable (unauthenticated
//!   access works for public repositories, with a tighter rate limit).
//! - All transport, serialization, and error handling are encapsulated here;
//!   the core only sees `TreeEntry` values and raw bytes.

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use vault_mirror_core::contract::{EntryKind, RemoteError, RemoteRepository, TreeEntry};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "vault-mirror";

pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    reference: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Client against the public GitHub API. `GITHUB_TOKEN` is picked up from
    /// the environment when present.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        reference: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let token = match std::env::var("GITHUB_TOKEN") {
            Ok(token) if !token.is_empty() => {
                tracing::info!("GITHUB_TOKEN found, using authenticated requests");
                Some(token)
            }
            _ => {
                tracing::warn!("GITHUB_TOKEN not set, using unauthenticated requests");
                None
            }
        };
        Self::with_base_url(API_BASE, owner, repo, reference, token)
    }

    /// Client against an explicit API base URL. Test seam for local stubs.
    pub fn with_base_url(
        base_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        reference: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            reference: reference.into(),
            token,
        })
    }

    fn request(&self, url: &str, accept: &'static str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, accept);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeNode>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeNode {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[async_trait]
impl RemoteRepository for GitHubClient {
    async fn list_tree(&self, reference: &str) -> Result<Vec<TreeEntry>, RemoteError> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.base_url, self.owner, self.repo, reference
        );
        tracing::info!(url = %url, "Listing remote repository tree");

        let resp = self.request(&url, "application/vnd.github+json").send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            tracing::error!(%status, url = %url, "GitHub tree API returned error. Response body: {body}");
            return Err(format!("GitHub tree API error ({status}): {body}").into());
        }

        let listing: TreeResponse = resp.json().await?;
        if listing.truncated {
            tracing::warn!(url = %url, "GitHub tree listing was truncated, some files will be missed this run");
        }

        let entries: Vec<TreeEntry> = listing
            .tree
            .into_iter()
            .map(|node| TreeEntry {
                path: node.path,
                content_hash: node.sha,
                kind: if node.kind == "blob" {
                    EntryKind::Blob
                } else {
                    EntryKind::Tree
                },
            })
            .collect();
        tracing::info!(count = entries.len(), "Listed remote repository tree");
        Ok(entries)
    }

    async fn fetch_raw(&self, path: &str) -> Result<Vec<u8>, RemoteError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.base_url, self.owner, self.repo, path, self.reference
        );
        tracing::debug!(url = %url, "Fetching raw content");

        // The raw media type returns file bytes directly, for text and
        // binary files alike, with no inline base64 envelope to unpack.
        let resp = self.request(&url, "application/vnd.github.raw").send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            tracing::error!(%status, path = %path, "GitHub contents API returned error. Response body: {body}");
            return Err(format!("GitHub contents API error ({status}) for {path}: {body}").into());
        }

        let bytes = resp.bytes().await?;
        tracing::debug!(path = %path, size = bytes.len(), "Fetched raw content");
        Ok(bytes.to_vec())
    }
}
