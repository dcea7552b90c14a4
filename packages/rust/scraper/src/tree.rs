//! Recursive tree scraper: fetch → extract → discover links → recurse.
//!
//! Each page's child links are scraped concurrently and joined preserving
//! on-page link order; the first failure anywhere in the tree rejects the
//! whole scrape. There is no retry and no partial result. Recursion ends on
//! pages whose navigation rule matches nothing, and a visited-URL guard drops
//! links that would revisit a page, so a cyclic site graph still terminates.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::{BoxFuture, try_join_all};
use reqwest::Client;
use scraper::Html;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use url::Url;

use manualmirror_shared::{
    DocumentNode, Link, ManualMetadata, ManualTree, MirrorError, Result, SiteConfig,
};

use crate::extract::{ScrapeRules, extract_section};
use crate::links::discover_links;

/// User-Agent string for scrape requests.
const USER_AGENT: &str = concat!("manualmirror/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting scrape status.
pub trait ScrapeProgress: Send + Sync {
    /// Called after each page fetch with the running fetch count.
    fn page_fetched(&self, url: &str, fetched: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ScrapeProgress for SilentProgress {
    fn page_fetched(&self, _url: &str, _fetched: usize) {}
}

// ---------------------------------------------------------------------------
// TreeScraper
// ---------------------------------------------------------------------------

/// Scrapes a manual site into a [`ManualTree`].
pub struct TreeScraper {
    client: Client,
    rules: ScrapeRules,
    base_url: Url,
    site: SiteConfig,
    visited: Mutex<HashSet<String>>,
    fetched: AtomicUsize,
}

impl TreeScraper {
    /// Build a scraper for the given site profile.
    pub fn new(site: SiteConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MirrorError::Network(format!("failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(&site.base_url)
            .map_err(|e| MirrorError::validation(format!("invalid base_url '{}': {e}", site.base_url)))?;

        let rules = ScrapeRules::from_site(&site)?;

        Ok(Self {
            client,
            rules,
            base_url,
            site,
            visited: Mutex::new(HashSet::new()),
            fetched: AtomicUsize::new(0),
        })
    }

    /// Scrape the whole manual.
    ///
    /// Fetches the root page, discovers the top-level sections via the sidebar
    /// rule, scrapes each concurrently, and attaches the results as children
    /// of the hand-authored root node.
    #[instrument(skip_all, fields(base_url = %self.base_url))]
    pub async fn scrape(&self, progress: &dyn ScrapeProgress) -> Result<ManualTree> {
        info!("starting scrape");

        self.visited
            .lock()
            .await
            .insert(normalize_url(&self.base_url));

        let body = self.fetch(&self.base_url, progress).await?;
        let sidebar = {
            let doc = Html::parse_document(&body);
            discover_links(&doc, &self.rules.sidebar, &self.base_url)
        };
        debug!(sections = sidebar.len(), "discovered top-level sections");

        let sections = self.claim(sidebar).await;
        let children = try_join_all(
            sections
                .into_iter()
                .map(|link| self.scrape_section(link, progress)),
        )
        .await?;

        let tree = ManualTree {
            title: self.site.root_title.clone(),
            contents: self.site.root_contents.clone(),
            metadata: ManualMetadata {
                url: self.base_url.clone(),
            },
            sync_key: self.site.sync_key.clone(),
            children,
        };

        info!(
            pages = self.fetched.load(Ordering::Relaxed),
            nodes = tree.node_count(),
            "scrape complete"
        );
        Ok(tree)
    }

    /// Scrape one page and, concurrently, every page its navigation links to.
    ///
    /// Child order follows on-page link order regardless of completion order.
    fn scrape_section<'a>(
        &'a self,
        link: Link,
        progress: &'a dyn ScrapeProgress,
    ) -> BoxFuture<'a, Result<DocumentNode>> {
        Box::pin(async move {
            let body = self.fetch(&link.url, progress).await?;

            // The parsed document is not Send; keep it off the await points.
            let (title, contents, nested) = {
                let doc = Html::parse_document(&body);
                let (title, contents) = extract_section(&doc, &self.rules)?;
                let nested = discover_links(&doc, &self.rules.nav, &self.base_url);
                (title, contents, nested)
            };

            let nested = self.claim(nested).await;
            let children = try_join_all(
                nested
                    .into_iter()
                    .map(|link| self.scrape_section(link, progress)),
            )
            .await?;

            Ok(DocumentNode {
                title,
                contents,
                children,
            })
        })
    }

    /// Keep only links whose URL no branch has claimed yet.
    async fn claim(&self, links: Vec<Link>) -> Vec<Link> {
        let mut visited = self.visited.lock().await;
        links
            .into_iter()
            .filter(|link| visited.insert(normalize_url(&link.url)))
            .collect()
    }

    async fn fetch(&self, url: &Url, progress: &dyn ScrapeProgress) -> Result<String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| MirrorError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MirrorError::Network(format!("{url}: body read failed: {e}")))?;

        let fetched = self.fetched.fetch_add(1, Ordering::Relaxed) + 1;
        progress.page_fetched(url.as_str(), fetched);
        Ok(body)
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.fetched.load(Ordering::Relaxed)
    }
}

/// Normalize a URL for the visited guard (strip fragment and trailing slash).
fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    let mut s = normalized.to_string();
    if s.ends_with('/') && s.matches('/').count() > 3 {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn site_for(server: &MockServer) -> SiteConfig {
        SiteConfig {
            base_url: server.uri(),
            root_title: "Example Manual".into(),
            root_contents: "<p>Unofficial copy.</p>".into(),
            sync_key: "Example Manual".into(),
            ..SiteConfig::default()
        }
    }

    fn root_page() -> &'static str {
        r##"<html><body>
            <main><h1>Example Manual</h1></main>
            <ul id="primaryTier">
                <li><a href="/title-a">Title A</a></li>
                <li><a href="/title-b">Title B</a></li>
            </ul>
        </body></html>"##
    }

    fn section_page(title: &str, body: &str, nav: &str) -> String {
        format!(
            r#"<html><body><main>
                <h1>{title}</h1>
                <div class="span"><p>{body}</p></div>
                <div class="mainColNav"><ul class="navlist">{nav}</ul></div>
            </main></body></html>"#
        )
    }

    async fn mount(server: &MockServer, route: &str, html: String, expected_fetches: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .expect(expected_fetches)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn scrape_assembles_tree_in_link_order() {
        let server = MockServer::start().await;

        mount(&server, "/", root_page().to_string(), 1).await;
        mount(
            &server,
            "/title-a",
            section_page(
                "Title A",
                "Section A text",
                r#"<li><a href="/title-a-1">A1</a></li>"#,
            ),
            1,
        )
        .await;
        mount(
            &server,
            "/title-a-1",
            section_page("A1", "Leaf A1 text", ""),
            1,
        )
        .await;
        mount(&server, "/title-b", section_page("Title B", "Section B text", ""), 1).await;

        let scraper = TreeScraper::new(site_for(&server)).unwrap();
        let tree = scraper.scrape(&SilentProgress).await.unwrap();

        assert_eq!(tree.title, "Example Manual");
        assert_eq!(tree.sync_key, "Example Manual");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].title, "Title A");
        assert_eq!(tree.children[1].title, "Title B");
        assert_eq!(tree.children[0].children.len(), 1);
        assert_eq!(tree.children[0].children[0].title, "A1");
        assert!(tree.children[1].children.is_empty());
        assert!(tree.children[0].contents.contains("Section A text"));

        // One fetch per discovered node (the `.expect()` counts verify each
        // page was hit exactly once; this verifies the total).
        assert_eq!(scraper.pages_fetched(), 4);
    }

    #[tokio::test]
    async fn failing_child_aborts_whole_scrape() {
        let server = MockServer::start().await;

        mount(&server, "/", root_page().to_string(), 1).await;
        // Whether /title-a gets fetched races against the failure, so no
        // expected count on it.
        Mock::given(method("GET"))
            .and(path("/title-a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(section_page("Title A", "Section A text", "")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/title-b"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let scraper = TreeScraper::new(site_for(&server)).unwrap();
        let err = scraper.scrape(&SilentProgress).await.unwrap_err();

        assert!(matches!(err, MirrorError::Network(_)));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn leaf_page_has_empty_children() {
        let server = MockServer::start().await;

        let root = r##"<html><body>
            <ul id="primaryTier"><li><a href="/only">Only</a></li></ul>
        </body></html>"##;
        mount(&server, "/", root.to_string(), 1).await;
        mount(&server, "/only", section_page("Only", "Text", ""), 1).await;

        let scraper = TreeScraper::new(site_for(&server)).unwrap();
        let tree = scraper.scrape(&SilentProgress).await.unwrap();

        assert_eq!(tree.children.len(), 1);
        assert!(tree.children[0].children.is_empty());
    }

    #[tokio::test]
    async fn cyclic_navigation_terminates() {
        let server = MockServer::start().await;

        let root = r##"<html><body>
            <ul id="primaryTier"><li><a href="/loop-a">Loop A</a></li></ul>
        </body></html>"##;
        mount(&server, "/", root.to_string(), 1).await;
        // A links to B, B links back to A and to the root page.
        mount(
            &server,
            "/loop-a",
            section_page("Loop A", "A text", r#"<li><a href="/loop-b">B</a></li>"#),
            1,
        )
        .await;
        mount(
            &server,
            "/loop-b",
            section_page(
                "Loop B",
                "B text",
                r#"<li><a href="/loop-a">A again</a></li><li><a href="/">Root</a></li>"#,
            ),
            1,
        )
        .await;

        let scraper = TreeScraper::new(site_for(&server)).unwrap();
        let tree = scraper.scrape(&SilentProgress).await.unwrap();

        // The back-links were already claimed, so B is a leaf.
        assert_eq!(tree.children[0].title, "Loop A");
        assert_eq!(tree.children[0].children[0].title, "Loop B");
        assert!(tree.children[0].children[0].children.is_empty());
        assert_eq!(scraper.pages_fetched(), 3);
    }

    #[tokio::test]
    async fn sibling_order_is_stable_under_slow_first_child() {
        let server = MockServer::start().await;

        let root = r##"<html><body>
            <ul id="primaryTier">
                <li><a href="/slow">Slow</a></li>
                <li><a href="/fast">Fast</a></li>
            </ul>
        </body></html>"##;
        mount(&server, "/", root.to_string(), 1).await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(section_page("Slow", "slow", ""))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        mount(&server, "/fast", section_page("Fast", "fast", ""), 1).await;

        let scraper = TreeScraper::new(site_for(&server)).unwrap();
        let tree = scraper.scrape(&SilentProgress).await.unwrap();

        // "Fast" completes first but still collects second.
        assert_eq!(tree.children[0].title, "Slow");
        assert_eq!(tree.children[1].title, "Fast");
    }
}
