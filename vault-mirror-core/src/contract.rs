//! # contract: interfaces the synchronisation core depends on
//!
//! This module defines the two traits the core calls out through — the content
//! store the cache lives in, and the remote repository the vault is mirrored
//! from — plus the plain data types they exchange.
//!
//! ## Interface & Extensibility
//! - Implement [`ContentStore`] to back the cache with a different medium
//!   (memory, disk, any KV service). The core only ever calls `get`/`set`/`remove`.
//! - Implement [`RemoteRepository`] to mirror from a different host. The core
//!   needs a recursive tree listing and raw byte fetches, nothing else.
//! - All methods are async, returning results and using boxed error types.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests.

use async_trait::async_trait;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

/// Error type for ContentStore implementations (simple boxed error for now)
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for RemoteRepository implementations
pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

/// A single entry of a recursive remote tree listing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TreeEntry {
    /// Path of the file relative to the repository root.
    pub path: String,
    /// Content-addressed identifier (e.g. a git blob sha). Change-detection
    /// token and cache key.
    pub content_hash: String,
    /// Whether the entry is a file or a directory.
    pub kind: EntryKind,
}

/// Kind of a tree entry as reported by the remote listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
}

/// Key-value persistence abstraction the cache is built on.
///
/// The backing medium is pluggable; implementors are responsible for
/// durability semantics. All mutation during a sync run goes through this
/// trait, and the read API only ever calls `get`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Look up the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove the value stored under `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Versioned remote source the vault is mirrored from.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// List the full recursive file tree at the given reference.
    async fn list_tree(&self, reference: &str) -> Result<Vec<TreeEntry>, RemoteError>;

    /// Fetch the raw bytes of the file at `path`.
    async fn fetch_raw(&self, path: &str) -> Result<Vec<u8>, RemoteError>;
}
