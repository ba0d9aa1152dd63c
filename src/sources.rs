use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use std::collections::VecDeque;

/// A lazy sequence of candidate URLs.
///
/// The orchestrator pulls from a source one URL at a time and stops as soon
/// as it has collected enough records, so a source never needs to produce
/// more than it is asked for.
#[async_trait]
pub trait UrlSource: Send {
    async fn next_url(&mut self) -> Option<String>;
}

/// A fixed list of URLs, yielded in order.
pub struct UrlList {
    urls: VecDeque<String>,
}

impl UrlList {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl UrlSource for UrlList {
    async fn next_url(&mut self) -> Option<String> {
        self.urls.pop_front()
    }
}

/// Result URLs for a search query, fetched lazily from the DuckDuckGo HTML
/// endpoint on the first pull.
///
/// A failed search logs the error and behaves as an exhausted source; the
/// caller sees an empty run, not a crash.
pub struct SearchResults {
    query: String,
    user_agent: String,
    fetched: bool,
    results: VecDeque<String>,
}

impl SearchResults {
    pub fn new(query: &str, config: &ScrapeConfig) -> Self {
        Self {
            query: query.to_string(),
            user_agent: config.user_agent.clone(),
            fetched: false,
            results: VecDeque::new(),
        }
    }

    async fn fetch_results(&self) -> Result<Vec<String>, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(ScrapeError::HttpClient)?;

        let response = client
            .post("https://html.duckduckgo.com/html/")
            .form(&[("q", self.query.as_str())])
            .header("Accept", "text/html")
            .send()
            .await
            .map_err(|e| ScrapeError::FetchNetwork {
                url: "https://html.duckduckgo.com/html/".to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::FetchHttp {
                url: "https://html.duckduckgo.com/html/".to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| ScrapeError::FetchNetwork {
            url: "https://html.duckduckgo.com/html/".to_string(),
            source: e,
        })?;

        Ok(parse_result_links(&body))
    }
}

#[async_trait]
impl UrlSource for SearchResults {
    async fn next_url(&mut self) -> Option<String> {
        if !self.fetched {
            self.fetched = true;
            match self.fetch_results().await {
                Ok(urls) => {
                    ::log::info!(
                        "Search for {:?} returned {} candidate URLs",
                        self.query,
                        urls.len()
                    );
                    self.results = urls.into();
                }
                Err(e) => {
                    ::log::error!("Search for {:?} failed: {}", self.query, e);
                }
            }
        }
        self.results.pop_front()
    }
}

/// Pulls result anchors out of a DuckDuckGo HTML search page
fn parse_result_links(body: &str) -> Vec<String> {
    let doc = Html::parse_document(body);
    let link_selector = Selector::parse("a.result__a").unwrap();

    doc.select(&link_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(unwrap_redirect)
        .filter(|url| url.starts_with("http"))
        .collect()
}

/// DuckDuckGo result hrefs are redirect links of the form
/// `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`; extract
/// and percent-decode the real destination.
fn unwrap_redirect(href: &str) -> String {
    if let Some(pos) = href.find("uddg=") {
        let start = pos + 5;
        let end = href[start..]
            .find('&')
            .map(|i| start + i)
            .unwrap_or(href.len());
        let encoded = &href[start..end];
        if !encoded.is_empty() {
            return percent_decode_str(encoded)
                .decode_utf8_lossy()
                .into_owned();
        }
    }
    href.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_url_list_yields_in_order_then_exhausts() {
        let mut source = UrlList::new(["https://a.example/", "https://b.example/"]);
        assert_eq!(source.next_url().await.as_deref(), Some("https://a.example/"));
        assert_eq!(source.next_url().await.as_deref(), Some("https://b.example/"));
        assert_eq!(source.next_url().await, None);
        assert_eq!(source.next_url().await, None);
    }

    #[test]
    fn test_unwrap_redirect() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=abc123";
        assert_eq!(unwrap_redirect(href), "https://example.com/page");

        // Direct links pass through untouched
        assert_eq!(
            unwrap_redirect("https://example.com/direct"),
            "https://example.com/direct"
        );
    }

    #[test]
    fn test_parse_result_links() {
        let body = r#"<html><body>
            <div class="result">
                <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fone.example%2F&rut=x">One</a>
            </div>
            <div class="result">
                <a class="result__a" href="https://two.example/">Two</a>
            </div>
            <a href="https://ignored.example/">Not a result</a>
        </body></html>"#;

        let links = parse_result_links(body);
        assert_eq!(
            links,
            vec!["https://one.example/".to_string(), "https://two.example/".to_string()]
        );
    }
}
