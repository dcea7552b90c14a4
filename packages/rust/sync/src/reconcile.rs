//! Tree reconciliation against the external document store.
//!
//! Walks the scraped tree next to the persisted tree and invokes exactly one
//! store operation per node: unchanged nodes are kept, changed nodes updated,
//! newly scraped nodes created, and persisted nodes no longer scraped removed.
//! Nodes match by sync key — the configured key for the root, the title for
//! everything below it.

use std::collections::HashMap;

use futures::future::BoxFuture;
use tracing::{debug, info, instrument};

use manualmirror_shared::{
    Classification, DocumentId, DocumentNode, ManualTree, MirrorError, Result,
};

use crate::store::{DocumentPayload, DocumentStore, StoredDocument, content_hash};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of one sync run: the reconciled root id plus per-operation counts.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Id of the root document after the sync.
    pub document_id: DocumentId,
    /// Nodes left untouched (hash and title matched).
    pub kept: usize,
    /// Nodes whose title or contents changed.
    pub updated: usize,
    /// Nodes newly created in the store.
    pub created: usize,
    /// Persisted nodes removed because they vanished upstream.
    pub deleted: usize,
}

impl SyncReport {
    fn new(document_id: DocumentId) -> Self {
        Self {
            document_id,
            kept: 0,
            updated: 0,
            created: 0,
            deleted: 0,
        }
    }

    /// Total store operations issued.
    pub fn total_ops(&self) -> usize {
        self.kept + self.updated + self.created + self.deleted
    }
}

// ---------------------------------------------------------------------------
// Node view
// ---------------------------------------------------------------------------

/// Uniform borrow of a scraped node: the root and inner nodes differ only in
/// where their sync key comes from.
#[derive(Clone, Copy)]
struct NodeView<'a> {
    sync_key: &'a str,
    title: &'a str,
    contents: &'a str,
    children: &'a [DocumentNode],
}

impl<'a> NodeView<'a> {
    fn root(manual: &'a ManualTree) -> Self {
        Self {
            sync_key: &manual.sync_key,
            title: &manual.title,
            contents: &manual.contents,
            children: &manual.children,
        }
    }

    fn node(node: &'a DocumentNode) -> Self {
        Self {
            sync_key: &node.title,
            title: &node.title,
            contents: &node.contents,
            children: &node.children,
        }
    }

    fn payload(&self, class: &Classification) -> DocumentPayload {
        DocumentPayload {
            sync_key: self.sync_key.to_string(),
            title: self.title.to_string(),
            contents: self.contents.to_string(),
            classification: class.clone(),
            updated_at: chrono::Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Reconcile a scraped manual against the store.
///
/// With an `existing_id` the persisted tree is fetched and diffed; without
/// one the whole tree is created fresh. The first store failure aborts the
/// sync — no intermediate state is rolled back.
#[instrument(skip_all, fields(existing = ?existing_id.map(ToString::to_string)))]
pub async fn sync_tree<S: DocumentStore>(
    store: &S,
    manual: &ManualTree,
    existing_id: Option<&DocumentId>,
    classification: &Classification,
) -> Result<SyncReport> {
    let root = NodeView::root(manual);

    let report = match existing_id {
        None => {
            info!("no existing document, creating full tree");
            let mut report = SyncReport::new(DocumentId::new());
            let root_id = create_subtree(store, None, root, classification, &mut report).await?;
            report.document_id = root_id;
            report
        }
        Some(id) => {
            let stored = store
                .fetch_document(id)
                .await?
                .ok_or_else(|| MirrorError::Sync(format!("existing document {id} not found")))?;

            if stored.sync_key != manual.sync_key {
                return Err(MirrorError::validation(format!(
                    "document {id} has sync key '{}', expected '{}'",
                    stored.sync_key, manual.sync_key
                )));
            }

            let mut report = SyncReport::new(stored.id.clone());
            reconcile_node(store, root, &stored, classification, &mut report).await?;
            report
        }
    };

    info!(
        kept = report.kept,
        updated = report.updated,
        created = report.created,
        deleted = report.deleted,
        "sync complete"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Recursive walk
// ---------------------------------------------------------------------------

fn reconcile_node<'a, S: DocumentStore>(
    store: &'a S,
    scraped: NodeView<'a>,
    stored: &'a StoredDocument,
    class: &'a Classification,
    report: &'a mut SyncReport,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let hash = content_hash(scraped.contents);
        if stored.content_hash == hash && stored.title == scraped.title {
            store.keep_document(&stored.id).await?;
            report.kept += 1;
        } else {
            debug!(sync_key = scraped.sync_key, "contents changed, updating");
            store
                .update_document(&stored.id, &scraped.payload(class))
                .await?;
            report.updated += 1;
        }

        // Index persisted children by sync key; scraped order drives the walk.
        let mut persisted: HashMap<&str, &StoredDocument> = stored
            .children
            .iter()
            .map(|child| (child.sync_key.as_str(), child))
            .collect();

        for child in scraped.children {
            let view = NodeView::node(child);
            match persisted.remove(view.sync_key) {
                Some(existing) => {
                    reconcile_node(store, view, existing, class, report).await?;
                }
                None => {
                    create_subtree(store, Some(&stored.id), view, class, report).await?;
                }
            }
        }

        // Anything left in the index vanished upstream.
        for stale in persisted.into_values() {
            debug!(sync_key = %stale.sync_key, "vanished upstream, removing");
            store.remove_document(&stale.id).await?;
            report.deleted += 1;
        }

        Ok(())
    })
}

fn create_subtree<'a, S: DocumentStore>(
    store: &'a S,
    parent: Option<&'a DocumentId>,
    node: NodeView<'a>,
    class: &'a Classification,
    report: &'a mut SyncReport,
) -> BoxFuture<'a, Result<DocumentId>> {
    Box::pin(async move {
        let id = store.create_document(parent, &node.payload(class)).await?;
        report.created += 1;

        for child in node.children {
            create_subtree(store, Some(&id), NodeView::node(child), class, report).await?;
        }

        Ok(id)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
