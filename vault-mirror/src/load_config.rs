/// `load_config` module: Loads and adapts a static YAML config — including
/// environment secret injection — into the typed configs the core and server
/// consume.
///
/// This module is the only place where untrusted YAML is parsed and mapped to
/// rich, strongly-typed internal structs.
///
/// # Responsibilities
/// - Parse user-supplied YAML configuration files into type-safe Rust structs
/// - Map loosely-typed YAML keys (e.g., string processor kinds) to enums
/// - Inject environment variables for secret fields (the GitHub token)
/// - Ensure robust error messages for CLI and tests: any failure in loading
///   must result in clear diagnostics.
///
/// # Errors
/// All errors in this module use `anyhow::Error` for context-rich diagnostics,
/// and are surfaced at the CLI boundary.
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info};
use vault_mirror_core::config::SyncConfig;
use vault_mirror_core::pipeline::ProcessorKind;

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub remote: RemoteSection,
    #[serde(default)]
    pub content: ContentSection,
    #[serde(default)]
    pub process: ProcessSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Deserialize)]
pub struct RemoteSection {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_reference")]
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct ContentSection {
    #[serde(default = "default_article_dir")]
    pub article_dir: String,
    #[serde(default = "default_attachment_dir")]
    pub attachment_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessSection {
    #[serde(default = "default_processor_kind")]
    pub kind: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_reference() -> String {
    "main".to_string()
}

fn default_article_dir() -> String {
    "Article".to_string()
}

fn default_attachment_dir() -> String {
    "Attachment".to_string()
}

fn default_processor_kind() -> String {
    "compile".to_string()
}

fn default_concurrency() -> usize {
    8
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            article_dir: default_article_dir(),
            attachment_dir: default_attachment_dir(),
        }
    }
}

impl Default for ProcessSection {
    fn default() -> Self {
        Self {
            kind: default_processor_kind(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl CliConfig {
    /// Map the loaded YAML onto the core's sync configuration.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            reference: self.remote.reference.clone(),
            article_dir: self.content.article_dir.clone(),
            attachment_dir: self.content.attachment_dir.clone(),
            processor: ProcessorKind::from(self.process.kind.as_str()),
            concurrency: self.process.concurrency,
        }
    }
}

/// Loads a static YAML config file (no secrets). Secrets are injected from
/// the environment where they are consumed (see the GitHub client).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match std::fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    Ok(config)
}
