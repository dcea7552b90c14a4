//! Anchor parsing and CSS-rule link discovery.
//!
//! Discovered hrefs resolve against the *fixed* configured base URL, not the
//! page they were found on — the manual site publishes base-relative paths.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use manualmirror_shared::Link;

/// Parse an anchor element into a normalized link descriptor.
///
/// Fragment-only, `mailto:`, `tel:`, and `javascript:` hrefs yield `None`,
/// as does an href the base URL cannot resolve.
pub fn parse_link(el: ElementRef<'_>, base: &Url) -> Option<Link> {
    let href = el.value().attr("href")?;

    if href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let url = base.join(href).ok()?;

    let label = el.text().collect::<String>().trim().to_string();
    let label = if label.is_empty() { None } else { Some(label) };

    Some(Link { url, label })
}

/// Collect every link matching `selector`, in document order.
pub fn discover_links(doc: &Html, selector: &Selector, base: &Url) -> Vec<Link> {
    doc.select(selector)
        .filter_map(|el| parse_link(el, base))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://www.example.gov/police-manual").unwrap()
    }

    fn first_anchor(html: &str) -> Option<Link> {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("a").unwrap();
        let el = doc.select(&sel).next().expect("anchor in fixture");
        parse_link(el, &base())
    }

    #[test]
    fn resolves_base_relative_href() {
        let link = first_anchor(r#"<a href="/police-manual/title5">Title 5</a>"#).unwrap();
        assert_eq!(
            link.url.as_str(),
            "http://www.example.gov/police-manual/title5"
        );
        assert_eq!(link.label.as_deref(), Some("Title 5"));
    }

    #[test]
    fn keeps_absolute_href() {
        let link = first_anchor(r#"<a href="http://other.example.gov/page">Other</a>"#).unwrap();
        assert_eq!(link.url.as_str(), "http://other.example.gov/page");
    }

    #[test]
    fn skips_fragment_and_script_hrefs() {
        assert!(first_anchor(r##"<a href="#section">Jump</a>"##).is_none());
        assert!(first_anchor(r#"<a href="mailto:spd@example.gov">Mail</a>"#).is_none());
        assert!(first_anchor(r#"<a href="javascript:void(0)">Click</a>"#).is_none());
        assert!(first_anchor("<a>No href</a>").is_none());
    }

    #[test]
    fn empty_anchor_text_yields_no_label() {
        let link = first_anchor(r#"<a href="/police-manual/title8">  </a>"#).unwrap();
        assert!(link.label.is_none());
    }

    #[test]
    fn discovery_preserves_document_order() {
        let doc = Html::parse_fragment(
            r##"<ul class="navlist">
                <li><a href="/a">A</a></li>
                <li><a href="#skip">Skip</a></li>
                <li><a href="/b">B</a></li>
            </ul>"##,
        );
        let sel = Selector::parse(".navlist a").unwrap();
        let links = discover_links(&doc, &sel, &base());

        let labels: Vec<_> = links.iter().filter_map(|l| l.label.as_deref()).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }
}
