use tracing::{debug, info};

use crate::pipeline::ProcessorKind;

/// What one synchronisation run operates on: which reference to mirror, which
/// directories hold articles and attachments, and how fetched content is
/// processed.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Branch, tag or commit to list the remote tree at.
    pub reference: String,
    /// Repository directory containing markdown articles.
    pub article_dir: String,
    /// Repository directory containing image attachments.
    pub attachment_dir: String,
    pub processor: ProcessorKind,
    /// Bound on concurrent remote fetches.
    pub concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reference: "main".to_string(),
            article_dir: "Article".to_string(),
            attachment_dir: "Attachment".to_string(),
            processor: ProcessorKind::Compile,
            concurrency: 8,
        }
    }
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            reference = %self.reference,
            article_dir = %self.article_dir,
            attachment_dir = %self.attachment_dir,
            concurrency = self.concurrency,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}
