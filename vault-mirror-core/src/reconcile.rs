//! Manifest reconciliation: diff the remote tree against the last-published
//! manifest and classify every entry.
//!
//! Matching key is the content hash, not the path. A changed file yields a new
//! hash, so "modified" is indistinguishable from "new" here; both land in
//! `to_fetch`. A file renamed without a content change keeps its hash, is
//! classified unchanged, and carries its previous metadata (slug, source path,
//! created_at) forward verbatim.
//!
//! Pure CPU-only set comparison; all I/O happens before (tree listing) and
//! after (pipeline, publisher) this step.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::contract::TreeEntry;
use crate::manifest::Hashed;

/// Disjoint classification of remote and manifest entries for one sync run.
#[derive(Debug, Clone)]
pub struct ReconcilePlan<E> {
    /// Manifest entries whose hash still appears in the remote tree,
    /// carried forward verbatim with no re-fetch.
    pub unchanged: Vec<E>,
    /// Remote entries whose hash has no match in the previous manifest.
    pub to_fetch: Vec<TreeEntry>,
    /// Manifest entries whose hash no longer appears in the remote tree.
    pub to_delete: Vec<E>,
}

impl<E> ReconcilePlan<E> {
    /// True when the run has nothing to fetch and nothing to delete.
    pub fn is_noop(&self) -> bool {
        self.to_fetch.is_empty() && self.to_delete.is_empty()
    }
}

/// Compare the remote tree against the previous manifest entries.
///
/// Remote duplicates by hash are collapsed, first occurrence wins; input
/// order is preserved in `to_fetch`.
pub fn reconcile<E>(remote: &[TreeEntry], previous: &[E]) -> ReconcilePlan<E>
where
    E: Hashed + Clone,
{
    let mut remote_by_hash: HashMap<&str, &TreeEntry> = HashMap::new();
    let mut remote_in_order: Vec<&TreeEntry> = Vec::new();
    for entry in remote {
        if !remote_by_hash.contains_key(entry.content_hash.as_str()) {
            remote_by_hash.insert(entry.content_hash.as_str(), entry);
            remote_in_order.push(entry);
        }
    }

    let previous_hashes: HashSet<&str> = previous.iter().map(|e| e.content_hash()).collect();

    let mut unchanged = Vec::new();
    let mut to_delete = Vec::new();
    for entry in previous {
        if remote_by_hash.contains_key(entry.content_hash()) {
            unchanged.push(entry.clone());
        } else {
            to_delete.push(entry.clone());
        }
    }

    let to_fetch: Vec<TreeEntry> = remote_in_order
        .into_iter()
        .filter(|e| !previous_hashes.contains(e.content_hash.as_str()))
        .cloned()
        .collect();

    debug!(
        unchanged = unchanged.len(),
        to_fetch = to_fetch.len(),
        to_delete = to_delete.len(),
        "Reconciled remote tree against previous manifest"
    );

    ReconcilePlan {
        unchanged,
        to_fetch,
        to_delete,
    }
}
