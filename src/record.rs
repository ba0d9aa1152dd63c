use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured extraction result for a single scraped URL.
///
/// A record is built once per URL per run and never mutated after extraction
/// completes. A record with no title and empty collections is valid: it means
/// the page was fetched but yielded nothing, which is distinct from a failed
/// fetch (no record at all).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Resolved source URL; every URL-valued field below is absolute,
    /// resolved against this
    pub url: String,

    /// First `<title>` text, if any
    pub title: Option<String>,

    /// Meta tags, keyed by `name` with `property` as fallback
    pub meta_tags: MetaTags,

    /// Headings and paragraphs in document order
    pub content: Vec<ContentBlock>,

    /// Anchors found inside navigation-like containers
    pub navigation_links: Vec<NavLink>,

    /// Every `<a href>` on the page
    pub links: Links,

    /// Every `<img>`, src resolved to absolute form
    pub images: Vec<ImageRef>,

    /// Every `<video>`, src and poster resolved to absolute form
    pub videos: Vec<VideoRef>,

    /// Parsed JSON-LD blocks; malformed blocks are skipped
    pub structured_data: Vec<serde_json::Value>,

    /// Open Graph tags, keyed by the property suffix after `og:`
    pub open_graph: BTreeMap<String, String>,
}

/// Meta tag collection.
///
/// The two scrape paths produce different shapes for the same concept: the
/// static extractor collapses duplicate names last-write-wins into a map,
/// while the browser path preserves duplicates as an ordered list. The
/// divergence is kept explicit here instead of being merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaTags {
    /// Static-extraction shape: name -> content, last write wins
    Map(BTreeMap<String, String>),
    /// Browser-extraction shape: document order, duplicates preserved
    List(Vec<MetaTag>),
}

/// A single name/content meta pair (browser-extraction shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
}

/// Page link collection, divergent like [`MetaTags`]: the static extractor
/// keeps per-link metadata, the browser path keeps deduplicated URL strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Links {
    /// Static-extraction shape: one entry per anchor, with metadata
    Detailed(Vec<Link>),
    /// Browser-extraction shape: deduplicated absolute URLs, first-seen order
    Plain(Vec<String>),
}

/// One block of visible text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// An `h1`..`h6` element; `level` is the tag's numeric suffix (1..=6)
    Heading { level: u8, text: String },
    /// A `p` element
    Paragraph { text: String },
}

impl ContentBlock {
    /// Text of the block, whichever kind it is
    pub fn text(&self) -> &str {
        match self {
            ContentBlock::Heading { text, .. } => text,
            ContentBlock::Paragraph { text } => text,
        }
    }
}

/// Anchor found inside a navigation-like container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    pub text: String,
    pub url: String,
    pub title: Option<String>,
}

/// Anchor with its metadata (static-extraction shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
    pub title: Option<String>,
    pub rel: Option<String>,
}

/// Image reference with its presentation attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub alt: String,
    pub title: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

/// Video reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    pub url: String,
    pub width: Option<String>,
    pub height: Option<String>,
    pub poster: Option<String>,
}

impl PageRecord {
    /// Empty record in the static-extraction shape
    pub fn for_static(url: &str) -> Self {
        Self::empty(url, MetaTags::Map(BTreeMap::new()), Links::Detailed(Vec::new()))
    }

    /// Empty record in the browser-extraction shape
    pub fn for_browser(url: &str) -> Self {
        Self::empty(url, MetaTags::List(Vec::new()), Links::Plain(Vec::new()))
    }

    fn empty(url: &str, meta_tags: MetaTags, links: Links) -> Self {
        Self {
            url: url.to_string(),
            title: None,
            meta_tags,
            content: Vec::new(),
            navigation_links: Vec::new(),
            links,
            images: Vec::new(),
            videos: Vec::new(),
            structured_data: Vec::new(),
            open_graph: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_static_record() -> PageRecord {
        let mut record = PageRecord::for_static("https://example.com/page");
        record.title = Some("Example".to_string());
        record.meta_tags = MetaTags::Map(BTreeMap::from([(
            "description".to_string(),
            "An example page".to_string(),
        )]));
        record.content = vec![
            ContentBlock::Heading {
                level: 1,
                text: "Welcome".to_string(),
            },
            ContentBlock::Paragraph {
                text: "Hello there.".to_string(),
            },
        ];
        record.navigation_links = vec![NavLink {
            text: "Home".to_string(),
            url: "https://example.com/".to_string(),
            title: None,
        }];
        record.links = Links::Detailed(vec![Link {
            text: "Docs".to_string(),
            url: "https://example.com/docs".to_string(),
            title: Some("Documentation".to_string()),
            rel: Some("nofollow".to_string()),
        }]);
        record.images = vec![ImageRef {
            url: "https://example.com/logo.png".to_string(),
            alt: "logo".to_string(),
            title: None,
            width: Some("64".to_string()),
            height: Some("64".to_string()),
        }];
        record.videos = vec![VideoRef {
            url: "https://example.com/intro.mp4".to_string(),
            width: None,
            height: None,
            poster: Some("https://example.com/poster.jpg".to_string()),
        }];
        record.structured_data =
            vec![serde_json::json!({"@type": "WebPage", "name": "Example"})];
        record.open_graph =
            BTreeMap::from([("title".to_string(), "Example".to_string())]);
        record
    }

    #[test]
    fn test_json_round_trip_static_shape() {
        let record = sample_static_record();
        let json = serde_json::to_string_pretty(&record).unwrap();
        let reloaded: PageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, reloaded);
    }

    #[test]
    fn test_json_round_trip_browser_shape() {
        let mut record = PageRecord::for_browser("https://example.com/");
        record.meta_tags = MetaTags::List(vec![
            MetaTag {
                name: "viewport".to_string(),
                content: "width=device-width".to_string(),
            },
            MetaTag {
                name: "viewport".to_string(),
                content: "initial-scale=1".to_string(),
            },
        ]);
        record.links = Links::Plain(vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
        ]);
        let json = serde_json::to_string(&record).unwrap();
        let reloaded: PageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, reloaded);
    }

    #[test]
    fn test_content_block_tagging() {
        let heading = ContentBlock::Heading {
            level: 2,
            text: "Section".to_string(),
        };
        let json = serde_json::to_value(&heading).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["level"], 2);

        // Paragraphs carry no level field at all
        let paragraph = ContentBlock::Paragraph {
            text: "Body.".to_string(),
        };
        let json = serde_json::to_value(&paragraph).unwrap();
        assert_eq!(json["type"], "paragraph");
        assert!(json.get("level").is_none());
    }

    #[test]
    fn test_divergent_shapes_serialize_distinctly() {
        let map = MetaTags::Map(BTreeMap::from([("a".to_string(), "1".to_string())]));
        assert!(serde_json::to_value(&map).unwrap().is_object());

        let list = MetaTags::List(vec![MetaTag {
            name: "a".to_string(),
            content: "1".to_string(),
        }]);
        assert!(serde_json::to_value(&list).unwrap().is_array());

        let plain = Links::Plain(vec!["https://example.com/".to_string()]);
        let value = serde_json::to_value(&plain).unwrap();
        assert!(value[0].is_string());
    }

    #[test]
    fn test_empty_record_is_valid() {
        let record = PageRecord::for_static("https://example.com/empty");
        assert!(record.title.is_none());
        assert!(record.content.is_empty());
        let json = serde_json::to_string(&record).unwrap();
        let reloaded: PageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.url, "https://example.com/empty");
    }
}
