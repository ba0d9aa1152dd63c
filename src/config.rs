use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for a scrape run.
///
/// Every field has a default, so a config file only needs to name the values
/// it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Number of page records to collect before a batch run stops
    #[serde(default = "default_result_target")]
    pub result_target: usize,

    /// Socket timeout for plain HTTP fetches, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long the browser variant waits for the document body to appear
    #[serde(default = "default_page_load_timeout")]
    pub page_load_timeout_secs: u64,

    /// Unconditional settle pause after navigation, in seconds
    #[serde(default = "default_settle")]
    pub settle_secs: u64,

    /// Pause between scroll passes while waiting for lazy content, in seconds
    #[serde(default = "default_scroll_pause")]
    pub scroll_pause_secs: u64,

    /// Maximum scroll passes; None means keep scrolling until the page
    /// height stops growing, however long that takes
    #[serde(default)]
    pub scroll_limit: Option<u32>,

    /// Attempts for DOM reads that hit a stale element reference
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between stale-element retry attempts, in milliseconds
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Inclusive bounds for the random delay between requests, in milliseconds
    #[serde(default = "default_jitter_range")]
    pub jitter_range_ms: (u64, u64),

    /// User-Agent header sent by both scrape modes
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// URL for the WebDriver instance used by the browser variant
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            result_target: default_result_target(),
            request_timeout_secs: default_request_timeout(),
            page_load_timeout_secs: default_page_load_timeout(),
            settle_secs: default_settle(),
            scroll_pause_secs: default_scroll_pause(),
            scroll_limit: None,
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
            jitter_range_ms: default_jitter_range(),
            user_agent: default_user_agent(),
            webdriver_url: default_webdriver_url(),
        }
    }
}

impl ScrapeConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Override the WebDriver URL from the WEBDRIVER_URL environment
    /// variable when it is set and non-empty
    pub fn apply_env_overrides(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_secs(self.scroll_pause_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn default_result_target() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    15
}

fn default_page_load_timeout() -> u64 {
    30
}

fn default_settle() -> u64 {
    5
}

fn default_scroll_pause() -> u64 {
    2
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    1000
}

fn default_jitter_range() -> (u64, u64) {
    (1000, 3000)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.result_target, 10);
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.page_load_timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_backoff_ms, 1000);
        assert_eq!(config.jitter_range_ms, (1000, 3000));
        assert_eq!(config.scroll_limit, None);
        assert_eq!(config.webdriver_url, "http://localhost:4444");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            ScrapeConfig::from_json(r#"{"result_target": 3, "scroll_limit": 20}"#).unwrap();
        assert_eq!(config.result_target, 3);
        assert_eq!(config.scroll_limit, Some(20));
        // Everything else keeps its default
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.jitter_range_ms, (1000, 3000));
    }

    #[test]
    fn test_empty_json_is_all_defaults() {
        let config = ScrapeConfig::from_json("{}").unwrap();
        assert_eq!(config.result_target, ScrapeConfig::default().result_target);
        assert_eq!(config.user_agent, ScrapeConfig::default().user_agent);
    }
}
