//! Application configuration for manualmirror.
//!
//! User config lives at `~/.manualmirror/manualmirror.toml`.
//! CLI flags override config file values, which override defaults.
//! The built-in defaults target the Seattle PD policy manual site.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "manualmirror.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".manualmirror";

// ---------------------------------------------------------------------------
// Config structs (matching manualmirror.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target site profile: base URL, selectors, root node values.
    #[serde(default)]
    pub site: SiteConfig,

    /// Document-store settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// `[site]` section — where and how to scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Root URL of the manual; discovered links resolve against this.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Title of the hand-authored root node.
    #[serde(default = "default_root_title")]
    pub root_title: String,

    /// Contents of the hand-authored root node (already-safe HTML).
    #[serde(default = "default_root_contents")]
    pub root_contents: String,

    /// Stable key identifying the root document to the external store.
    #[serde(default = "default_sync_key")]
    pub sync_key: String,

    /// Element scoping title/content extraction on each page.
    #[serde(default = "default_scope_selector")]
    pub scope_selector: String,

    /// Specific content-block selector, preferred when it matches repeatedly.
    #[serde(default = "default_content_selector")]
    pub content_selector: String,

    /// Generic content fallback selector.
    #[serde(default = "default_content_fallback_selector")]
    pub content_fallback_selector: String,

    /// Top-level sidebar link rule, applied to the root page only.
    #[serde(default = "default_sidebar_selector")]
    pub sidebar_selector: String,

    /// Nested in-page navigation link rule, applied below the root.
    #[serde(default = "default_nav_selector")]
    pub nav_selector: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            root_title: default_root_title(),
            root_contents: default_root_contents(),
            sync_key: default_sync_key(),
            scope_selector: default_scope_selector(),
            content_selector: default_content_selector(),
            content_fallback_selector: default_content_fallback_selector(),
            sidebar_selector: default_sidebar_selector(),
            nav_selector: default_nav_selector(),
        }
    }
}

fn default_base_url() -> String {
    "http://www.seattle.gov/police-manual".into()
}
fn default_root_title() -> String {
    "Seattle Police Department Manual".into()
}
fn default_root_contents() -> String {
    "This is an unofficial copy of the Seattle PD manual. The official manual \
     can be found at <a href=\"http://www.seattle.gov/police-manual\">\
     http://www.seattle.gov/police-manual</a>."
        .into()
}
fn default_sync_key() -> String {
    "Seattle Police Department Manual".into()
}
fn default_scope_selector() -> String {
    "main".into()
}
fn default_content_selector() -> String {
    ".MainColumnXHTMLCopyComponent".into()
}
fn default_content_fallback_selector() -> String {
    "div.span".into()
}
fn default_sidebar_selector() -> String {
    "#primaryTier > li > a".into()
}
fn default_nav_selector() -> String {
    ".mainColNav .navlist a".into()
}

/// `[sync]` section — external document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the store's HTTP API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,

    /// Classification type attached to every store operation.
    #[serde(default = "default_doc_type")]
    pub doc_type: String,

    /// Classification subtype.
    #[serde(default = "default_subtype")]
    pub subtype: String,

    /// Classification locale.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Identifier of the pre-existing document to reconcile against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_document_id: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token_env: default_api_token_env(),
            doc_type: default_doc_type(),
            subtype: default_subtype(),
            locale: default_locale(),
            existing_document_id: None,
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8080/api".into()
}
fn default_api_token_env() -> String {
    "MANUALMIRROR_API_TOKEN".into()
}
fn default_doc_type() -> String {
    "policy".into()
}
fn default_subtype() -> String {
    "department_policy".into()
}
fn default_locale() -> String {
    "seattle".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.manualmirror/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MirrorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.manualmirror/manualmirror.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| MirrorError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| MirrorError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| MirrorError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| MirrorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| MirrorError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the store API token env var is set and non-empty.
pub fn validate_api_token(config: &AppConfig) -> Result<()> {
    let var_name = &config.sync.api_token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(MirrorError::config(format!(
            "store API token not found. Set the {var_name} environment variable."
        ))),
    }
}
