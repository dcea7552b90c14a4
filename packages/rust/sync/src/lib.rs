//! Reconciliation of a scraped manual tree against an external document store.
//!
//! This crate provides:
//! - [`DocumentStore`] — the injected contract of four operations
//!   (keep/update/create/delete) plus tree retrieval
//! - [`HttpStore`] — reqwest-backed client implementing the contract
//! - [`sync_tree`] — the reconcile driver walking scraped vs. persisted trees

pub mod http;
pub mod reconcile;
pub mod store;

pub use http::HttpStore;
pub use reconcile::{SyncReport, sync_tree};
pub use store::{DocumentPayload, DocumentStore, StoredDocument, content_hash};
