//! Automated web reconnaissance: turn a URL, a URL list, or a search query
//! into structured page records.
//!
//! Pages are retrieved either with a plain HTTP fetch
//! ([`scrapers::http::HttpScraper`]) or through a WebDriver-controlled
//! headless browser session ([`scrapers::browser::BrowserScraper`]), then
//! reduced to a [`record::PageRecord`]: title, meta tags, content blocks,
//! links, media, JSON-LD, and Open Graph data, with every URL resolved to
//! absolute form. The [`batch`] orchestrator runs one URL at a time with a
//! jitter delay between requests, and [`output`] persists the collected
//! records as JSON or CSV.

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod record;
pub mod scrapers;
pub mod sources;

// Re-export commonly used types for convenience
pub use config::ScrapeConfig;
pub use error::ScrapeError;
pub use record::PageRecord;
