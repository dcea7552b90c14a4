//! Tree scraper for published policy-manual sites.
//!
//! This crate provides:
//! - [`TreeScraper`] — recursive, concurrent page scraper assembling a [`manualmirror_shared::ManualTree`]
//! - [`sanitize`] — allow-list HTML sanitizer for page contents
//! - [`links`] — anchor parsing and CSS-rule link discovery
//! - [`extract`] — title/content extraction rules

pub mod extract;
pub mod links;
pub mod sanitize;
pub mod tree;

pub use extract::{ScrapeRules, extract_section};
pub use links::{discover_links, parse_link};
pub use sanitize::sanitize;
pub use tree::{ScrapeProgress, SilentProgress, TreeScraper};
