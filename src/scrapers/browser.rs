use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::extract::{clean_text, heading_level, resolve};
use crate::record::{Links, MetaTag, MetaTags, NavLink, PageRecord};
use crate::scrapers::PageScraper;
use crate::scrapers::retry::{RetryPolicy, is_stale, with_retry};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use std::collections::HashSet;
use url::Url;

/// Browser-mode scraper: one isolated headless session per URL, live-DOM
/// extraction with stale-element retries.
///
/// Unlike the static mode, a page-load timeout here still yields a record
/// carrying whatever was collected before the failure.
pub struct BrowserScraper {
    config: ScrapeConfig,
    policy: RetryPolicy,
}

impl BrowserScraper {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            config: config.clone(),
            policy: RetryPolicy::from_config(config),
        }
    }

    async fn connect(&self) -> Result<Client, ScrapeError> {
        let mut caps = serde_json::map::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({
                "args": [
                    "--headless",
                    "--disable-gpu",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    "--window-size=1920,1080",
                    format!("--user-agent={}", self.config.user_agent),
                ],
            }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.config.webdriver_url)
            .await?;
        ::log::debug!("Connected to WebDriver at {}", self.config.webdriver_url);
        Ok(client)
    }

    /// Runs `op`, retrying stale-element failures; exhausted retries
    /// surface as a typed StaleElement error
    async fn retrying<T, F, Fut>(&self, op: F) -> Result<T, ScrapeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CmdError>>,
    {
        with_retry(&self.policy, is_stale, op).await.map_err(|e| {
            if is_stale(&e) {
                ScrapeError::StaleElement {
                    attempts: self.policy.max_attempts,
                }
            } else {
                ScrapeError::Webdriver(e)
            }
        })
    }

    /// Navigates, waits for readiness, expands lazy content, and fills the
    /// record field by field. Leaves whatever was already collected in
    /// place when a step fails.
    async fn collect(
        &self,
        client: &Client,
        url: &str,
        base: &Url,
        record: &mut PageRecord,
    ) -> Result<(), ScrapeError> {
        client.goto(url).await?;
        tokio::time::sleep(self.config.settle()).await;

        client
            .wait()
            .at_most(self.config.page_load_timeout())
            .for_element(Locator::Css("body"))
            .await
            .map_err(|_| ScrapeError::PageLoadTimeout {
                url: url.to_string(),
            })?;

        scroll_to_end(client, &self.config).await?;

        record.title = self.extract_title(client).await?;
        record.meta_tags = MetaTags::List(self.extract_meta_tags(client).await?);
        record.content = self.extract_content(client).await?;
        record.navigation_links = self.extract_navigation_links(client, base).await?;
        record.links = Links::Plain(self.extract_links(client, base).await?);
        record.images = self.extract_images(client, base).await?;
        record.videos = self.extract_videos(client, base).await?;
        record.structured_data = self.extract_structured_data(client, url).await?;
        record.open_graph = self.extract_open_graph(client).await?;

        Ok(())
    }

    async fn extract_title(&self, client: &Client) -> Result<Option<String>, ScrapeError> {
        let value = self
            .retrying(|| client.execute("return document.title;", Vec::new()))
            .await?;
        Ok(value
            .as_str()
            .map(clean_text)
            .filter(|title| !title.is_empty()))
    }

    /// Document order, duplicates preserved; key falls back from `name`
    /// to `property`
    async fn extract_meta_tags(&self, client: &Client) -> Result<Vec<MetaTag>, ScrapeError> {
        let metas = self
            .retrying(|| client.find_all(Locator::Css("meta")))
            .await?;

        let mut tags = Vec::new();
        for meta in &metas {
            let name = match self.attr(meta, "name").await? {
                Some(name) => Some(name),
                None => self.attr(meta, "property").await?,
            };
            let Some(name) = name else { continue };
            let content = self.attr(meta, "content").await?.unwrap_or_default();
            tags.push(MetaTag { name, content });
        }
        Ok(tags)
    }

    async fn extract_content(
        &self,
        client: &Client,
    ) -> Result<Vec<crate::record::ContentBlock>, ScrapeError> {
        use crate::record::ContentBlock;

        let elements = self
            .retrying(|| client.find_all(Locator::Css("h1, h2, h3, h4, h5, h6, p")))
            .await?;

        let mut blocks = Vec::new();
        for element in &elements {
            let tag = self
                .retrying(|| element.prop("tagName"))
                .await?
                .unwrap_or_default()
                .to_lowercase();
            let text = clean_text(&self.retrying(|| element.text()).await?);

            let block = match heading_level(&tag) {
                Some(level) => ContentBlock::Heading { level, text },
                None => ContentBlock::Paragraph { text },
            };
            blocks.push(block);
        }
        Ok(blocks)
    }

    /// Relaxed navigation scope: any anchor under nav, header, or footer
    async fn extract_navigation_links(
        &self,
        client: &Client,
        base: &Url,
    ) -> Result<Vec<NavLink>, ScrapeError> {
        let anchors = self
            .retrying(|| client.find_all(Locator::Css("nav a, header a, footer a")))
            .await?;

        let mut nav_links = Vec::new();
        for anchor in &anchors {
            let Some(href) = self.attr(anchor, "href").await? else {
                continue;
            };
            let Some(url) = resolve(base, &href) else {
                continue;
            };
            nav_links.push(NavLink {
                text: clean_text(&self.retrying(|| anchor.text()).await?),
                url,
                title: self.attr(anchor, "title").await?,
            });
        }
        Ok(nav_links)
    }

    /// Deduplicated absolute URLs in first-seen order
    async fn extract_links(
        &self,
        client: &Client,
        base: &Url,
    ) -> Result<Vec<String>, ScrapeError> {
        let anchors = self.retrying(|| client.find_all(Locator::Css("a"))).await?;

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for anchor in &anchors {
            let Some(href) = self.attr(anchor, "href").await? else {
                continue;
            };
            let Some(url) = resolve(base, &href) else {
                continue;
            };
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
        Ok(links)
    }

    async fn extract_images(
        &self,
        client: &Client,
        base: &Url,
    ) -> Result<Vec<crate::record::ImageRef>, ScrapeError> {
        use crate::record::ImageRef;

        let images = self
            .retrying(|| client.find_all(Locator::Css("img")))
            .await?;

        let mut refs = Vec::new();
        for image in &images {
            let src = self.attr(image, "src").await?.unwrap_or_default();
            let Some(url) = resolve(base, &src) else {
                continue;
            };
            refs.push(ImageRef {
                url,
                alt: self.attr(image, "alt").await?.unwrap_or_default(),
                title: self.attr(image, "title").await?,
                width: self.attr(image, "width").await?,
                height: self.attr(image, "height").await?,
            });
        }
        Ok(refs)
    }

    async fn extract_videos(
        &self,
        client: &Client,
        base: &Url,
    ) -> Result<Vec<crate::record::VideoRef>, ScrapeError> {
        use crate::record::VideoRef;

        let videos = self
            .retrying(|| client.find_all(Locator::Css("video")))
            .await?;

        let mut refs = Vec::new();
        for video in &videos {
            let src = self.attr(video, "src").await?.unwrap_or_default();
            let Some(url) = resolve(base, &src) else {
                continue;
            };
            refs.push(VideoRef {
                url,
                width: self.attr(video, "width").await?,
                height: self.attr(video, "height").await?,
                poster: match self.attr(video, "poster").await? {
                    Some(poster) => resolve(base, &poster),
                    None => None,
                },
            });
        }
        Ok(refs)
    }

    async fn extract_structured_data(
        &self,
        client: &Client,
        url: &str,
    ) -> Result<Vec<serde_json::Value>, ScrapeError> {
        let scripts = self
            .retrying(|| client.find_all(Locator::Css(r#"script[type="application/ld+json"]"#)))
            .await?;

        let mut blocks = Vec::new();
        for script in &scripts {
            let raw = self.retrying(|| script.html(true)).await?;
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => blocks.push(value),
                Err(e) => {
                    ::log::warn!("Malformed JSON-LD in {}: {}", url, e);
                }
            }
        }
        Ok(blocks)
    }

    async fn extract_open_graph(
        &self,
        client: &Client,
    ) -> Result<std::collections::BTreeMap<String, String>, ScrapeError> {
        let metas = self
            .retrying(|| client.find_all(Locator::Css(r#"meta[property^="og:"]"#)))
            .await?;

        let mut tags = std::collections::BTreeMap::new();
        for meta in &metas {
            let property = self.attr(meta, "property").await?.unwrap_or_default();
            if let Some(suffix) = property.strip_prefix("og:") {
                let content = self.attr(meta, "content").await?.unwrap_or_default();
                tags.insert(suffix.to_string(), content);
            }
        }
        Ok(tags)
    }

    async fn attr(&self, element: &Element, name: &str) -> Result<Option<String>, ScrapeError> {
        self.retrying(|| element.attr(name)).await
    }
}

#[async_trait]
impl PageScraper for BrowserScraper {
    /// The session is torn down on every exit path; an error during
    /// collection degrades to a partial record rather than a lost URL.
    async fn scrape(&self, url: &str) -> Result<Option<PageRecord>, ScrapeError> {
        let base = match Url::parse(url) {
            Ok(base) => base,
            Err(e) => {
                ::log::warn!("Skipping unparseable URL {}: {}", url, e);
                return Ok(None);
            }
        };

        let client = self.connect().await?;
        let mut record = PageRecord::for_browser(url);
        let outcome = self.collect(&client, url, &base, &mut record).await;

        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close browser session for {}: {}", url, e);
        }

        Ok(degrade_to_partial(url, outcome, record))
    }
}

/// A collection failure costs only the fields not yet filled in: the record
/// is returned as-is, never discarded. Only a connect failure loses the URL.
fn degrade_to_partial(
    url: &str,
    outcome: Result<(), ScrapeError>,
    record: PageRecord,
) -> Option<PageRecord> {
    match outcome {
        Ok(()) => {}
        Err(ScrapeError::PageLoadTimeout { .. }) => {
            ::log::warn!("Timed out waiting for {} to load", url);
        }
        Err(e) => {
            ::log::error!("Error while scraping {}: {}", url, e);
        }
    }
    Some(record)
}

/// Repeatedly scrolls to the bottom and waits for the page height to settle,
/// so lazily-loaded content is present before extraction.
///
/// With no scroll limit configured this loops for as long as the height keeps
/// growing; a true infinite-scroll page will keep it busy indefinitely unless
/// `scroll_limit` is set.
pub async fn scroll_to_end(client: &Client, config: &ScrapeConfig) -> Result<(), CmdError> {
    let mut last_height = page_height(client).await?;
    let mut passes = 0u32;

    loop {
        client
            .execute("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
            .await?;
        tokio::time::sleep(config.scroll_pause()).await;

        let new_height = page_height(client).await?;
        if new_height == last_height {
            break;
        }
        last_height = new_height;

        passes += 1;
        if let Some(limit) = config.scroll_limit {
            if passes >= limit {
                ::log::warn!(
                    "Page height still growing after {} scroll passes, stopping",
                    passes
                );
                break;
            }
        }
    }

    ::log::debug!("Scroll settled at height {} after {} passes", last_height, passes);
    Ok(())
}

async fn page_height(client: &Client) -> Result<i64, CmdError> {
    let value = client
        .execute("return document.body.scrollHeight;", Vec::new())
        .await?;
    Ok(value.as_i64().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_shared_with_static_path() {
        assert_eq!(heading_level("h1"), Some(1));
        assert_eq!(heading_level("h6"), Some(6));
        assert_eq!(heading_level("h7"), None);
        assert_eq!(heading_level("p"), None);
        assert_eq!(heading_level("header"), None);
    }

    #[test]
    fn test_page_load_timeout_degrades_to_partial_record() {
        let mut record = PageRecord::for_browser("https://example.com/");
        record.title = Some("Partial".to_string());
        let outcome = Err(ScrapeError::PageLoadTimeout {
            url: "https://example.com/".to_string(),
        });

        let result = degrade_to_partial("https://example.com/", outcome, record);
        let record = result.expect("timeout must not lose the record");
        assert_eq!(record.title.as_deref(), Some("Partial"));
    }

    #[test]
    fn test_collection_error_degrades_to_partial_record() {
        let record = PageRecord::for_browser("https://example.com/");
        let outcome = Err(ScrapeError::StaleElement { attempts: 3 });

        let result = degrade_to_partial("https://example.com/", outcome, record);
        assert!(result.is_some());
    }

    #[test]
    fn test_clean_collection_keeps_record() {
        let record = PageRecord::for_browser("https://example.com/");
        let result = degrade_to_partial("https://example.com/", Ok(()), record);
        assert_eq!(result.unwrap().url, "https://example.com/");
    }

    #[test]
    fn test_resolve_against_base() {
        let base = Url::parse("https://example.com/a/b").unwrap();
        assert_eq!(
            resolve(&base, "c").as_deref(),
            Some("https://example.com/a/c")
        );
        assert_eq!(
            resolve(&base, "").as_deref(),
            Some("https://example.com/a/b")
        );
    }
}
