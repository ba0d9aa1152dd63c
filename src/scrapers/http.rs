use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::extract;
use crate::record::PageRecord;
use crate::scrapers::PageScraper;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use url::Url;

/// Static-mode scraper: one GET with browser-like headers, then extraction
/// over the returned HTML.
pub struct HttpScraper {
    client: reqwest::Client,
    config: ScrapeConfig,
}

impl HttpScraper {
    pub fn new(config: &ScrapeConfig) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(ScrapeError::HttpClient)?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Fetches the page body, classifying every failure mode.
    ///
    /// A 403 is additionally logged as a likely bot block, since that is the
    /// most common reason a scraper sees one.
    pub async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 403 {
                ::log::warn!(
                    "403 Forbidden for {}. The website may be blocking scrapers.",
                    url
                );
            }
            return Err(ScrapeError::FetchHttp {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_transport(url, e))
    }
}

#[async_trait]
impl PageScraper for HttpScraper {
    /// Fetch failures degrade to `Ok(None)` so the caller can skip the URL
    /// and move on.
    async fn scrape(&self, url: &str) -> Result<Option<PageRecord>, ScrapeError> {
        let html = match self.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                ::log::warn!("{}", e);
                return Ok(None);
            }
        };

        let base = match Url::parse(url) {
            Ok(base) => base,
            Err(e) => {
                ::log::warn!("Skipping unparseable URL {}: {}", url, e);
                return Ok(None);
            }
        };

        ::log::debug!(
            "Fetched {} bytes from {} (timeout {}s)",
            html.len(),
            url,
            self.config.request_timeout_secs
        );
        Ok(Some(extract::extract_page(&html, &base)))
    }
}

fn classify_transport(url: &str, error: reqwest::Error) -> ScrapeError {
    if error.is_timeout() {
        ScrapeError::FetchTimeout {
            url: url.to_string(),
        }
    } else {
        ScrapeError::FetchNetwork {
            url: url.to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_with_default_config() {
        let config = ScrapeConfig::default();
        assert!(HttpScraper::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unparseable_url_is_skipped_not_fatal() {
        // The fetch itself fails first for a garbage URL; either way the
        // scraper must answer Ok(None), never an error
        let scraper = HttpScraper::new(&ScrapeConfig::default()).unwrap();
        let result = scraper.scrape("not a url at all").await.unwrap();
        assert!(result.is_none());
    }
}
