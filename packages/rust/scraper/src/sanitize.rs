//! Allow-list HTML sanitizer for scraped page contents.
//!
//! Tags outside the allow-list are stripped while their text survives, except
//! for a small set whose content is discarded outright (`script`, `style`, …).
//! An exclusion pass then removes `h1`/`h2` elements whole (the page title
//! travels separately on the node) and any non-`br` element with no surviving
//! text after tag stripping.

use ego_tree::NodeRef;
use scraper::{Html, Node};

/// Tags allowed to survive sanitization.
const ALLOWED_TAGS: &[&str] = &[
    "h3", "h4", "h5", "h6", "blockquote", "p", "a", "ul", "ol", "li", "b", "i", "strong", "em",
    "strike", "code", "hr", "br", "div", "table", "thead", "caption", "tbody", "tr", "th", "td",
    "pre",
];

/// Heading levels admitted to the allow-list only so the exclusion pass can
/// remove the whole element, text included, instead of merely stripping the tag.
const EXCLUDED_HEADINGS: &[&str] = &["h1", "h2"];

/// Tags whose content is discarded entirely rather than stripped to text.
const DISCARDED_TAGS: &[&str] = &["script", "style", "textarea", "option", "head", "title"];

/// Attributes that survive on `<a>` elements; every other attribute is dropped.
const ANCHOR_ATTRS: &[&str] = &["href", "name", "target"];

/// A rendered subtree: its sanitized HTML and the visible text that survived.
struct Rendered {
    html: String,
    text: String,
}

/// Sanitize an HTML fragment down to the allow-list, dropping empty elements.
///
/// The result is trimmed; whitespace-only input sanitizes to the empty string.
pub fn sanitize(html: &str) -> String {
    let doc = Html::parse_fragment(html);

    let mut out = String::new();
    for child in doc.root_element().children() {
        if let Some(rendered) = render_node(child) {
            out.push_str(&rendered.html);
        }
    }
    out.trim().to_string()
}

/// Render one node bottom-up, or `None` when the exclusion rules drop it.
///
/// Working bottom-up means the emptiness check sees only *surviving* text, so
/// an element left hollow by its children's removal is itself removed.
fn render_node(node: NodeRef<'_, Node>) -> Option<Rendered> {
    match node.value() {
        Node::Text(text) => Some(Rendered {
            html: escape_text(&text),
            text: text.to_string(),
        }),
        Node::Element(el) => {
            let name = el.name();

            if DISCARDED_TAGS.contains(&name) || EXCLUDED_HEADINGS.contains(&name) {
                return None;
            }

            let mut inner_html = String::new();
            let mut inner_text = String::new();
            for child in node.children() {
                if let Some(rendered) = render_node(child) {
                    inner_html.push_str(&rendered.html);
                    inner_text.push_str(&rendered.text);
                }
            }

            if name != "br" && inner_text.trim().is_empty() {
                return None;
            }

            if !ALLOWED_TAGS.contains(&name) {
                // Strip the tag, keep what its children rendered to.
                return Some(Rendered {
                    html: inner_html,
                    text: inner_text,
                });
            }

            let attrs = render_attrs(&el, name);
            let html = if name == "br" {
                "<br>".to_string()
            } else {
                format!("<{name}{attrs}>{inner_html}</{name}>")
            };
            Some(Rendered {
                html,
                text: inner_text,
            })
        }
        // Comments, doctypes, processing instructions.
        _ => None,
    }
}

/// Render the surviving attributes of an element (`<a>` only).
fn render_attrs(el: &scraper::node::Element, name: &str) -> String {
    if name != "a" {
        return String::new();
    }

    let mut out = String::new();
    for attr in ANCHOR_ATTRS {
        if let Some(value) = el.attr(attr) {
            out.push_str(&format!(" {attr}=\"{}\"", escape_attr(value)));
        }
    }
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
