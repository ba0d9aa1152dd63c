use crate::record::{
    ContentBlock, ImageRef, Link, Links, MetaTags, NavLink, PageRecord, VideoRef,
};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;


/// Extracts a structured page record from static HTML.
///
/// Never fails: malformed or missing optional markup produces empty fields,
/// and a JSON-LD block that does not parse is logged and skipped. Every
/// URL-valued field in the result is resolved to absolute form against `base`.
pub fn extract_page(html: &str, base: &Url) -> PageRecord {
    let doc = Html::parse_document(html);
    let mut record = PageRecord::for_static(base.as_str());

    record.title = extract_title(&doc);
    record.meta_tags = MetaTags::Map(extract_meta_tags(&doc));
    record.content = extract_content(&doc);
    record.navigation_links = extract_navigation_links(&doc, base);
    record.links = Links::Detailed(extract_links(&doc, base));
    record.images = extract_images(&doc, base);
    record.videos = extract_videos(&doc, base);
    record.structured_data = extract_structured_data(&doc, base);
    record.open_graph = extract_open_graph(&doc);

    record
}

/// Collapses runs of whitespace to single spaces and trims the ends
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a possibly-relative href against the base URL.
///
/// An empty href resolves to the base itself, so an `<img>` without a src
/// still yields a well-formed absolute URL. Hrefs the `url` crate cannot
/// join (e.g. `https://` with no host) are dropped.
pub(crate) fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(Into::into)
}

fn extract_title(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").unwrap();
    doc.select(&selector)
        .next()
        .map(|el| clean_text(&el.text().collect::<String>()))
        .filter(|title| !title.is_empty())
}

/// Key is the `name` attribute, falling back to `property`; tags with
/// neither are ignored. Duplicate keys collapse last-write-wins.
fn extract_meta_tags(doc: &Html) -> BTreeMap<String, String> {
    let selector = Selector::parse("meta").unwrap();
    let mut tags = BTreeMap::new();

    for meta in doc.select(&selector) {
        let name = meta
            .value()
            .attr("name")
            .or_else(|| meta.value().attr("property"));
        if let Some(name) = name {
            let content = meta.value().attr("content").unwrap_or_default();
            tags.insert(name.to_string(), content.to_string());
        }
    }

    tags
}

fn extract_content(doc: &Html) -> Vec<ContentBlock> {
    let selector = Selector::parse("h1, h2, h3, h4, h5, h6, p").unwrap();
    doc.select(&selector)
        .map(|el| {
            let text = clean_text(&el.text().collect::<String>());
            match heading_level(el.value().name()) {
                Some(level) => ContentBlock::Heading { level, text },
                None => ContentBlock::Paragraph { text },
            }
        })
        .collect()
}

/// Numeric suffix of an h1..h6 tag name; None for anything else
pub(crate) fn heading_level(tag_name: &str) -> Option<u8> {
    tag_name
        .strip_prefix(['h', 'H'])
        .and_then(|suffix| suffix.parse::<u8>().ok())
        .filter(|level| (1..=6).contains(level))
}

/// Anchors inside `<nav>` elements; when the page has no `<nav>` at all,
/// falls back to elements whose class attribute contains "nav"
/// case-insensitively (so `<div class="Navbar">` counts).
fn extract_navigation_links(doc: &Html, base: &Url) -> Vec<NavLink> {
    let nav_selector = Selector::parse("nav").unwrap();
    let anchor_selector = Selector::parse("a[href]").unwrap();

    let mut containers: Vec<ElementRef> = doc.select(&nav_selector).collect();
    if containers.is_empty() {
        let classed = Selector::parse("[class]").unwrap();
        containers = doc
            .select(&classed)
            .filter(|el| {
                el.value()
                    .attr("class")
                    .is_some_and(|class| class.to_lowercase().contains("nav"))
            })
            .collect();
    }

    let mut nav_links = Vec::new();
    for container in containers {
        for anchor in container.select(&anchor_selector) {
            let href = anchor.value().attr("href").unwrap_or_default();
            if let Some(url) = resolve(base, href) {
                nav_links.push(NavLink {
                    text: clean_text(&anchor.text().collect::<String>()),
                    url,
                    title: anchor.value().attr("title").map(str::to_string),
                });
            }
        }
    }

    nav_links
}

fn extract_links(doc: &Html, base: &Url) -> Vec<Link> {
    let selector = Selector::parse("a[href]").unwrap();
    doc.select(&selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let url = resolve(base, href)?;
            Some(Link {
                text: clean_text(&anchor.text().collect::<String>()),
                url,
                title: anchor.value().attr("title").map(str::to_string),
                rel: anchor.value().attr("rel").map(str::to_string),
            })
        })
        .collect()
}

fn extract_images(doc: &Html, base: &Url) -> Vec<ImageRef> {
    let selector = Selector::parse("img").unwrap();
    doc.select(&selector)
        .filter_map(|img| {
            let src = img.value().attr("src").unwrap_or_default();
            let url = resolve(base, src)?;
            Some(ImageRef {
                url,
                alt: img.value().attr("alt").unwrap_or_default().to_string(),
                title: img.value().attr("title").map(str::to_string),
                width: img.value().attr("width").map(str::to_string),
                height: img.value().attr("height").map(str::to_string),
            })
        })
        .collect()
}

fn extract_videos(doc: &Html, base: &Url) -> Vec<VideoRef> {
    let selector = Selector::parse("video").unwrap();
    doc.select(&selector)
        .filter_map(|video| {
            let src = video.value().attr("src").unwrap_or_default();
            let url = resolve(base, src)?;
            Some(VideoRef {
                url,
                width: video.value().attr("width").map(str::to_string),
                height: video.value().attr("height").map(str::to_string),
                poster: video
                    .value()
                    .attr("poster")
                    .and_then(|poster| resolve(base, poster)),
            })
        })
        .collect()
}

/// Parses each `<script type="application/ld+json">` block as JSON.
/// A block that fails to parse is logged and omitted; it never fails the
/// rest of the record.
fn extract_structured_data(doc: &Html, base: &Url) -> Vec<serde_json::Value> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    let mut blocks = Vec::new();

    for script in doc.select(&selector) {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => blocks.push(value),
            Err(e) => {
                ::log::warn!("Malformed JSON-LD in {}: {}", base, e);
            }
        }
    }

    blocks
}

/// `og:`-prefixed meta properties, keyed by the text after the prefix
fn extract_open_graph(doc: &Html) -> BTreeMap<String, String> {
    let selector = Selector::parse(r#"meta[property^="og:"]"#).unwrap();
    let mut tags = BTreeMap::new();

    for meta in doc.select(&selector) {
        let property = meta.value().attr("property").unwrap_or_default();
        if let Some(suffix) = property.strip_prefix("og:") {
            let content = meta.value().attr("content").unwrap_or_default();
            tags.insert(suffix.to_string(), content.to_string());
        }
    }

    tags
}
