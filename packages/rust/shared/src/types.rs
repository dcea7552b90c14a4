//! Core domain types for the scraped document tree.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// DocumentId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for store document identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Generate a new time-sortable document identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// DocumentNode
// ---------------------------------------------------------------------------

/// A single scraped page: title, sanitized HTML contents, and ordered children.
///
/// Child order mirrors on-page link order and is significant. Nodes are never
/// mutated after construction; a node is fully built (title + contents +
/// finished children) before being returned to its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Page title (first-level heading text).
    pub title: String,
    /// Sanitized HTML contents; empty when the page carries no body text.
    pub contents: String,
    /// Child pages in on-page link order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    /// Construct a childless node.
    pub fn leaf(title: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            contents: contents.into(),
            children: Vec::new(),
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(DocumentNode::node_count)
            .sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// ManualTree
// ---------------------------------------------------------------------------

/// Metadata carried by the hand-authored root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualMetadata {
    /// The manual's public root URL.
    pub url: Url,
}

/// The assembled manual: a hand-authored root plus scraped sections.
///
/// The root carries a stable `sync_key` identifying it to the external store;
/// every other node is keyed by its title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualTree {
    pub title: String,
    pub contents: String,
    pub metadata: ManualMetadata,
    pub sync_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

impl ManualTree {
    /// Total number of nodes in the tree, including the root.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(DocumentNode::node_count)
            .sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// A normalized link descriptor discovered on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Absolute URL, resolved against the configured base.
    pub url: Url,
    /// Anchor text, when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Store-side classification attached to every reconciliation operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub subtype: String,
    pub locale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_roundtrip() {
        let id = DocumentId::new();
        let s = id.to_string();
        let parsed: DocumentId = s.parse().expect("parse DocumentId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn node_count_counts_whole_subtree() {
        let tree = DocumentNode {
            title: "Root".into(),
            contents: String::new(),
            children: vec![
                DocumentNode {
                    title: "A".into(),
                    contents: String::new(),
                    children: vec![DocumentNode::leaf("A1", "<p>a1</p>")],
                },
                DocumentNode::leaf("B", ""),
            ],
        };
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn tree_serialization_skips_empty_children() {
        let tree = ManualTree {
            title: "Manual".into(),
            contents: "<p>Intro</p>".into(),
            metadata: ManualMetadata {
                url: Url::parse("http://www.example.gov/manual").unwrap(),
            },
            sync_key: "Manual".into(),
            children: vec![DocumentNode::leaf("Section 1", "<p>One</p>")],
        };

        let json = serde_json::to_string(&tree).expect("serialize");
        let parsed: ManualTree = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, tree);
        // Leaf children are omitted from the wire form entirely.
        assert!(!json.contains("\"children\":[]"));
    }

    #[test]
    fn classification_uses_type_key() {
        let class = Classification {
            doc_type: "policy".into(),
            subtype: "department_policy".into(),
            locale: "seattle".into(),
        };
        let json = serde_json::to_string(&class).expect("serialize");
        assert!(json.contains("\"type\":\"policy\""));
        assert!(!json.contains("doc_type"));
    }
}
