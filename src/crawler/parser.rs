//! HTML extraction of links and text
//!
//! This module handles parsing a fetched page to extract:
//! - Links to follow, resolved to absolute URLs
//! - The visible text of the body
//! - `<meta name="robots">` directives that suppress either of the above

use ::url::Url;
use scraper::{Html, Node, Selector};

/// Elements whose text never counts as page text
const NON_TEXT_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// What a page yields for the crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Absolute links in document order; empty under `nofollow`
    pub links: Vec<String>,

    /// Whitespace-collapsed body text; `None` under `noindex`
    pub text: Option<String>,
}

/// Robots meta directives found in a page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MetaRobots {
    noindex: bool,
    nofollow: bool,
}

/// Extracts links and text from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags, resolved against `base_url` with the fragment removed
///
/// **Exclude:**
/// - Same-page anchors (`href` starting with `#`)
/// - Links whose resolved last path segment has an extension other than `.html`
/// - Anything that does not resolve to an `http` or `https` URL
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links, e.g. `http://example.com`
///
/// # Example
///
/// ```
/// use riweb_crawler::crawler::extract;
///
/// let html = r#"<html><body><a href="/a/b.html">B</a> Hello</body></html>"#;
/// let extracted = extract(html, "http://example.com");
/// assert_eq!(extracted.links, vec!["http://example.com/a/b.html"]);
/// assert_eq!(extracted.text.as_deref(), Some("B Hello"));
/// ```
pub fn extract(html: &str, base_url: &str) -> Extracted {
    let document = Html::parse_document(html);
    let meta = extract_meta_robots(&document);

    if meta.noindex || meta.nofollow {
        tracing::debug!(
            "Robots meta on {}: noindex={} nofollow={}",
            base_url,
            meta.noindex,
            meta.nofollow
        );
    }

    let links = if meta.nofollow {
        Vec::new()
    } else {
        match Url::parse(base_url) {
            Ok(base) => extract_links(&document, &base),
            Err(e) => {
                tracing::warn!("Invalid base URL {}: {}", base_url, e);
                Vec::new()
            }
        }
    };

    let text = if meta.noindex {
        None
    } else {
        Some(extract_text(&document))
    };

    Extracted { links, text }
}

fn extract_meta_robots(document: &Html) -> MetaRobots {
    let mut meta = MetaRobots::default();

    let Ok(selector) = Selector::parse("meta[name][content]") else {
        return meta;
    };

    for element in document.select(&selector) {
        let is_robots = element
            .value()
            .attr("name")
            .map_or(false, |name| name.eq_ignore_ascii_case("robots"));
        if !is_robots {
            continue;
        }

        if let Some(content) = element.value().attr("content") {
            let content = content.to_ascii_lowercase();
            meta.noindex |= content.contains("noindex");
            meta.nofollow |= content.contains("nofollow");
        }
    }

    meta
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves an href to an absolute URL, or None if it is not followed
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);

    if !is_page_link(&url) {
        return None;
    }

    Some(url.to_string())
}

/// Checks the last path segment for a non-HTML extension
fn is_page_link(url: &Url) -> bool {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    last.ends_with(".html") || !last.contains('.')
}

fn extract_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };

    let mut text = String::new();
    for body in document.select(&selector) {
        for node in body.descendants() {
            let Node::Text(fragment) = node.value() else {
                continue;
            };

            let hidden = node.ancestors().any(|ancestor| {
                matches!(ancestor.value(), Node::Element(element)
                    if NON_TEXT_ELEMENTS.contains(&element.name()))
            });
            if hidden {
                continue;
            }

            text.push(' ');
            text.push_str(fragment);
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
