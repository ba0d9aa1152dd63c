use crate::config::ScrapeConfig;
use crate::record::PageRecord;
use crate::scrapers::PageScraper;
use crate::sources::UrlSource;
use rand::Rng;
use std::time::Duration;

/// Drives fetch and extraction over a lazy URL source until `result_target`
/// records have been collected or the source runs dry.
///
/// URLs are processed strictly one at a time. Every failure — fetch, page
/// load, extraction — is logged and skipped; nothing a single URL does can
/// abort the batch. A randomized jitter delay separates consecutive
/// attempts so the request timing stays irregular.
pub async fn run_batch<S, P>(
    source: &mut S,
    scraper: &P,
    config: &ScrapeConfig,
) -> Vec<PageRecord>
where
    S: UrlSource + ?Sized,
    P: PageScraper + ?Sized,
{
    let mut results = Vec::new();

    while results.len() < config.result_target {
        let Some(url) = source.next_url().await else {
            ::log::info!("URL source exhausted after {} records", results.len());
            break;
        };

        ::log::info!("Crawling: {}", url);
        match scraper.scrape(&url).await {
            Ok(Some(record)) => results.push(record),
            Ok(None) => ::log::warn!("No content for {}, skipping", url),
            Err(e) => ::log::error!("Skipping {}: {}", url, e),
        }

        if results.len() >= config.result_target {
            break;
        }

        jitter_delay(config).await;
    }

    results
}

/// Sleeps a random duration drawn uniformly from the configured jitter range
async fn jitter_delay(config: &ScrapeConfig) {
    let (low, high) = config.jitter_range_ms;
    let millis = if high > low {
        rand::thread_rng().gen_range(low..=high)
    } else {
        low
    };
    ::log::debug!("Jitter delay: {}ms", millis);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::sources::UrlList;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scraper double that fails for chosen URLs and records what it saw
    struct ScriptedScraper {
        fail_on: Vec<String>,
        error_on: Vec<String>,
        attempted: Mutex<Vec<String>>,
    }

    impl ScriptedScraper {
        fn new() -> Self {
            Self {
                fail_on: Vec::new(),
                error_on: Vec::new(),
                attempted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageScraper for ScriptedScraper {
        async fn scrape(&self, url: &str) -> Result<Option<PageRecord>, ScrapeError> {
            self.attempted.lock().unwrap().push(url.to_string());
            if self.fail_on.iter().any(|u| u == url) {
                return Ok(None);
            }
            if self.error_on.iter().any(|u| u == url) {
                return Err(ScrapeError::FetchTimeout {
                    url: url.to_string(),
                });
            }
            Ok(Some(PageRecord::for_static(url)))
        }
    }

    fn urls(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("https://site{}.example/", i)).collect()
    }

    fn config_with_target(target: usize) -> ScrapeConfig {
        ScrapeConfig {
            result_target: target,
            ..ScrapeConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_target_count() {
        let mut source = UrlList::new(urls(10));
        let scraper = ScriptedScraper::new();
        let config = config_with_target(3);

        let results = run_batch(&mut source, &scraper, &config).await;
        assert_eq!(results.len(), 3);
        // Only three URLs were ever pulled
        assert_eq!(scraper.attempted.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_url_contributes_nothing_and_nothing_escapes() {
        let mut source = UrlList::new(urls(10));
        let mut scraper = ScriptedScraper::new();
        scraper.fail_on.push("https://site2.example/".to_string());
        let config = config_with_target(3);

        let results = run_batch(&mut source, &scraper, &config).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.url != "https://site2.example/"));
        // The failure cost one extra attempt
        assert_eq!(scraper.attempted.lock().unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scraper_error_is_isolated() {
        let mut source = UrlList::new(urls(5));
        let mut scraper = ScriptedScraper::new();
        scraper.error_on.push("https://site1.example/".to_string());
        let config = config_with_target(2);

        let results = run_batch(&mut source, &scraper, &config).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://site2.example/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_source_ends_run_short() {
        let mut source = UrlList::new(urls(2));
        let scraper = ScriptedScraper::new();
        let config = config_with_target(5);

        let results = run_batch(&mut source, &scraper, &config).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_delay_between_attempts() {
        let mut source = UrlList::new(urls(3));
        let scraper = ScriptedScraper::new();
        let mut config = config_with_target(3);
        config.jitter_range_ms = (1000, 3000);

        let start = tokio::time::Instant::now();
        run_batch(&mut source, &scraper, &config).await;
        // Two inter-request delays (none after the final URL), each in 1..=3s
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "elapsed: {:?}", elapsed);
        assert!(elapsed <= Duration::from_secs(6), "elapsed: {:?}", elapsed);
    }
}
