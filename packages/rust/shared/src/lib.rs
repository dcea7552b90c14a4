//! Shared types, error model, and configuration for manualmirror.
//!
//! This crate is the foundation depended on by all other manualmirror crates.
//! It provides:
//! - [`MirrorError`] — the unified error type
//! - Domain types ([`DocumentNode`], [`ManualTree`], [`Link`], [`Classification`], [`DocumentId`])
//! - Configuration ([`AppConfig`], [`SiteConfig`], [`SyncConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, SiteConfig, SyncConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_api_token,
};
pub use error::{MirrorError, Result};
pub use types::{Classification, DocumentId, DocumentNode, Link, ManualMetadata, ManualTree};
