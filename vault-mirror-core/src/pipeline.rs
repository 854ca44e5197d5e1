//! Per-file content pipeline: fetch raw bytes, apply transforms, persist the
//! result keyed by content hash.
//!
//! Transforms are deterministic: wiki-style image embeds are rewritten to
//! standard markdown references, frontmatter is extracted for entry metadata,
//! and the body is either compiled to a serialisable document or stored as
//! rewritten raw text depending on the configured [`ProcessorKind`].
//!
//! Content is written to the store *before* the entry metadata is returned,
//! so an entry handed to the publisher always references persisted content.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::contract::{ContentStore, RemoteError, RemoteRepository, StoreError, TreeEntry};
use crate::manifest::{article_content_key, image_content_key, ArticleInfo, ImageInfo};
use crate::slug;

/// How fetched markdown is turned into a cacheable artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorKind {
    /// Compile markdown into a serialisable document (metadata + HTML body)
    Compile,
    /// Store the link-rewritten markdown text verbatim
    Raw,
}

impl From<&str> for ProcessorKind {
    fn from(s: &str) -> Self {
        match s {
            "Compile" | "compile" | "compiled" => ProcessorKind::Compile,
            "Raw" | "raw" | "passthrough" => ProcessorKind::Raw,
            other => {
                warn!(kind = other, "Unknown processor kind, defaulting to Compile");
                ProcessorKind::Compile
            }
        }
    }
}

/// Per-file pipeline failure. A single file's failure is logged and skipped
/// by the orchestrator; it never aborts the run.
#[derive(Debug)]
pub enum PipelineError {
    Fetch(RemoteError),
    Store(StoreError),
    InvalidUtf8(std::string::FromUtf8Error),
    Encode(serde_json::Error),
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Encode(e)
    }
}

/// The compiled artifact stored for an article in [`ProcessorKind::Compile`] mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledDocument {
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    pub html: String,
}

static WIKI_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[\[([^\]]+)\]\]").unwrap());

/// Rewrite Obsidian-style `![[Name]]` image embeds to standard references:
/// `![Name](/image/sanitized-name)`. Any directory prefix inside the embed is
/// dropped. Plain `[[wiki links]]` without the `!` are left untouched.
pub fn rewrite_wiki_images(content: &str) -> String {
    WIKI_IMAGE
        .replace_all(content, |caps: &regex::Captures| {
            let embedded = &caps[1];
            let file_name = embedded.rsplit('/').next().unwrap_or(embedded);
            format!(
                "![{}](/image/{})",
                file_name,
                slug::sanitize_file_name(file_name)
            )
        })
        .into_owned()
}

/// Frontmatter fields the pipeline understands. Unknown keys are ignored;
/// a malformed block costs the article its metadata, never the article.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "createAt", alias = "created")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updateAt", alias = "updated")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

/// Split a leading `---` delimited YAML frontmatter block from the body.
/// Returns the raw YAML (if a complete block exists) and the remaining body.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(after_open) = content.strip_prefix("---") else {
        return (None, content);
    };
    let Some(rest) = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, content)
}

/// Parse a frontmatter block, falling back to empty metadata on bad YAML.
pub fn parse_front_matter(yaml: &str) -> FrontMatter {
    match serde_yaml::from_str(yaml) {
        Ok(front) => front,
        Err(e) => {
            warn!(error = %e, "Malformed frontmatter, keeping article without metadata");
            FrontMatter::default()
        }
    }
}

/// Lenient timestamp parsing for frontmatter dates: RFC 3339 first, then a
/// bare `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_front_matter_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    warn!(raw = trimmed, "Unparseable frontmatter date, ignoring");
    None
}

fn compile_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::all());
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn file_stem(path: &str) -> &str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// Fetch, transform and persist one article. The cached blob is written under
/// the entry's content hash before the returned metadata can reach a manifest.
pub async fn process_article<R, S>(
    remote: &R,
    store: &S,
    kind: ProcessorKind,
    entry: &TreeEntry,
) -> Result<ArticleInfo, PipelineError>
where
    R: RemoteRepository + ?Sized,
    S: ContentStore + ?Sized,
{
    let bytes = remote
        .fetch_raw(&entry.path)
        .await
        .map_err(PipelineError::Fetch)?;
    let text = String::from_utf8(bytes).map_err(PipelineError::InvalidUtf8)?;

    let rewritten = rewrite_wiki_images(&text);
    let (front_raw, body) = split_front_matter(&rewritten);
    let front = front_raw.map(parse_front_matter).unwrap_or_default();

    let blob = match kind {
        ProcessorKind::Compile => serde_json::to_vec(&CompiledDocument {
            title: front.title.clone(),
            description: front.description.clone().unwrap_or_default(),
            html: compile_html(body),
        })?,
        ProcessorKind::Raw => rewritten.clone().into_bytes(),
    };

    store
        .set(&article_content_key(&entry.content_hash), blob)
        .await
        .map_err(PipelineError::Store)?;
    debug!(path = %entry.path, hash = %entry.content_hash, "Persisted article content");

    Ok(ArticleInfo {
        name: front
            .title
            .unwrap_or_else(|| file_stem(&entry.path).to_string()),
        slug: slug::slugify_path(&entry.path),
        content_hash: entry.content_hash.clone(),
        source_path: entry.path.clone(),
        description: front.description.unwrap_or_default(),
        category: front.category,
        tags: front.tags,
        created_at: front.created_at.as_deref().and_then(parse_front_matter_date),
        updated_at: front.updated_at.as_deref().and_then(parse_front_matter_date),
        hidden: front.hidden,
    })
}

/// Fetch and persist one image verbatim under its sanitized filename.
pub async fn process_image<R, S>(
    remote: &R,
    store: &S,
    entry: &TreeEntry,
) -> Result<ImageInfo, PipelineError>
where
    R: RemoteRepository + ?Sized,
    S: ContentStore + ?Sized,
{
    let bytes = remote
        .fetch_raw(&entry.path)
        .await
        .map_err(PipelineError::Fetch)?;

    let file_name = entry.path.rsplit('/').next().unwrap_or(&entry.path);
    let name = slug::sanitize_file_name(file_name);

    store
        .set(&image_content_key(&name), bytes)
        .await
        .map_err(PipelineError::Store)?;
    debug!(path = %entry.path, name = %name, "Persisted image content");

    Ok(ImageInfo {
        name,
        content_hash: entry.content_hash.clone(),
        source_path: entry.path.clone(),
    })
}
