//! Document-store contract: the four reconciliation operations.
//!
//! The traversal and reconcile driver depend only on this trait, never on a
//! particular backing store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use manualmirror_shared::{Classification, DocumentId, Result};

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Fields the store needs to create or update one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentPayload {
    /// Stable key matching this document across syncs.
    pub sync_key: String,
    pub title: String,
    /// Sanitized HTML contents.
    pub contents: String,
    pub classification: Classification,
    pub updated_at: DateTime<Utc>,
}

/// A persisted document fetched from the store, with its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub sync_key: String,
    pub title: String,
    /// SHA-256 of the persisted contents, hex-encoded.
    pub content_hash: String,
    #[serde(default)]
    pub children: Vec<StoredDocument>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Reconciliation operations offered by an external document store.
///
/// Exactly one of `keep`/`update`/`create`/`remove` is invoked per tree node
/// during a sync; `fetch_document` loads the persisted tree the walk runs
/// against.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a persisted document tree by id; `None` when the id is unknown.
    async fn fetch_document(&self, id: &DocumentId) -> Result<Option<StoredDocument>>;

    /// Mark a document as still present and unchanged.
    async fn keep_document(&self, id: &DocumentId) -> Result<()>;

    /// Replace a document's title and contents.
    async fn update_document(&self, id: &DocumentId, doc: &DocumentPayload) -> Result<()>;

    /// Create a document under `parent` (`None` for a new root).
    /// Returns the id assigned by the store.
    async fn create_document(
        &self,
        parent: Option<&DocumentId>,
        doc: &DocumentPayload,
    ) -> Result<DocumentId>;

    /// Remove a document and its subtree.
    async fn remove_document(&self, id: &DocumentId) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// SHA-256 hash of document contents, hex-encoded.
pub fn content_hash(contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    format!("{:x}", hasher.finalize())
}
