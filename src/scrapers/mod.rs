pub mod browser;
pub mod http;
pub mod retry;

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::record::PageRecord;
use async_trait::async_trait;

/// Which scrape path to use for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMode {
    /// Single HTTP GET, static HTML extraction
    Http,
    /// Headless browser session per URL, live-DOM extraction
    Browser,
}

/// Builds a page record from a URL.
///
/// The two implementations produce different shapes for the fields that
/// historically diverged (see [`crate::record::MetaTags`] and
/// [`crate::record::Links`]); everything else follows the same extraction
/// rules.
///
/// `Ok(None)` means the fetch failed and the URL should be skipped; it is
/// never a batch-fatal condition.
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<Option<PageRecord>, ScrapeError>;
}

/// Constructs the scraper for the requested mode
pub fn build(
    mode: ScrapeMode,
    config: &ScrapeConfig,
) -> Result<Box<dyn PageScraper>, ScrapeError> {
    match mode {
        ScrapeMode::Http => Ok(Box::new(http::HttpScraper::new(config)?)),
        ScrapeMode::Browser => Ok(Box::new(browser::BrowserScraper::new(config))),
    }
}
