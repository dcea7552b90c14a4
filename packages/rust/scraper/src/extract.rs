//! Title and content extraction rules for manual pages.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use manualmirror_shared::{MirrorError, Result, SiteConfig};

use crate::sanitize::sanitize;

static H1_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid selector"));

/// Compiled CSS rules for one site profile.
#[derive(Debug)]
pub struct ScrapeRules {
    /// Element scoping title/content extraction on each page.
    pub scope: Selector,
    /// Specific content-block rule, preferred when it matches repeatedly.
    pub content: Selector,
    /// Generic content fallback rule.
    pub content_fallback: Selector,
    /// Top-level sidebar link rule (root page only).
    pub sidebar: Selector,
    /// Nested in-page navigation link rule.
    pub nav: Selector,
}

impl ScrapeRules {
    /// Compile the selectors of a site profile, failing on the first bad rule.
    pub fn from_site(site: &SiteConfig) -> Result<Self> {
        Ok(Self {
            scope: compile(&site.scope_selector)?,
            content: compile(&site.content_selector)?,
            content_fallback: compile(&site.content_fallback_selector)?,
            sidebar: compile(&site.sidebar_selector)?,
            nav: compile(&site.nav_selector)?,
        })
    }
}

fn compile(rule: &str) -> Result<Selector> {
    Selector::parse(rule).map_err(|e| MirrorError::parse(format!("bad selector '{rule}': {e}")))
}

/// Extract the page title and sanitized contents from a parsed page.
///
/// The title is the first `h1` inside the scope element; a page without one
/// is malformed and fails the scrape. The content block is the first match of
/// the specific rule when that rule matches more than once, otherwise the
/// first match of the generic fallback; a page with neither yields empty
/// contents.
pub fn extract_section(doc: &Html, rules: &ScrapeRules) -> Result<(String, String)> {
    let scope = doc
        .select(&rules.scope)
        .next()
        .ok_or_else(|| MirrorError::parse("page has no content scope element"))?;

    let title = scope
        .select(&H1_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MirrorError::parse("page has no title heading"))?;

    let specific: Vec<_> = scope.select(&rules.content).collect();
    let content_el = if specific.len() > 1 {
        Some(specific[0])
    } else {
        scope.select(&rules.content_fallback).next()
    };

    let contents = content_el
        .map(|el| sanitize(&el.inner_html()))
        .unwrap_or_default();

    Ok((title, contents))
}
