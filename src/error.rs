use thiserror::Error;

/// Everything that can go wrong while fetching, scraping, or persisting.
///
/// Fetch- and page-level failures are logged and degrade to "skip this URL"
/// at the batch layer; they never abort a run. Only user input errors (an
/// unsupported output format) cut an invocation short.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request timed out for {url}")]
    FetchTimeout { url: String },

    #[error("HTTP {status} for {url}")]
    FetchHttp { url: String, status: u16 },

    #[error("network error for {url}: {source}")]
    FetchNetwork { url: String, source: reqwest::Error },

    #[error("timed out waiting for {url} to load")]
    PageLoadTimeout { url: String },

    #[error("element reference went stale after {attempts} attempts")]
    StaleElement { attempts: u32 },

    #[error("failed to create WebDriver session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("WebDriver command failed: {0}")]
    Webdriver(#[from] fantoccini::error::CmdError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),

    #[error("unsupported output format: {0} (choose 'json' or 'csv')")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
