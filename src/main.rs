use clap::Parser;
use pageprobe::batch::run_batch;
use pageprobe::config::ScrapeConfig;
use pageprobe::output::{self, OutputFormat};
use pageprobe::record::PageRecord;
use pageprobe::scrapers::{self, PageScraper, ScrapeMode};
use pageprobe::sources::{SearchResults, UrlList, UrlSource};
use std::path::PathBuf;

mod args;
use args::{Args, Command, convert_format};

// Errors are logged, never turned into a non-zero exit: the run is always
// best-effort.
#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match ScrapeConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path.display(), e);
                return;
            }
        },
        None => ScrapeConfig::default(),
    };
    config.apply_env_overrides();

    match args.command {
        Command::Scrape {
            url,
            browser,
            format,
            output,
        } => {
            let mode = scrape_mode(browser);
            print_webdriver_note(mode, &config);

            let scraper = match scrapers::build(mode, &config) {
                Ok(scraper) => scraper,
                Err(e) => {
                    ::log::error!("Failed to set up scraper: {}", e);
                    return;
                }
            };

            ::log::info!("Scraping: {}", url);
            match scraper.scrape(&url).await {
                Ok(Some(record)) => persist_one(&record, convert_format(format), output),
                Ok(None) => println!("No content could be retrieved for {}", url),
                Err(e) => ::log::error!("Failed to scrape {}: {}", url, e),
            }
        }

        Command::Search {
            query,
            count,
            browser,
            format,
            output,
        } => {
            if let Some(count) = count {
                config.result_target = count;
            }
            let mode = scrape_mode(browser);
            print_webdriver_note(mode, &config);

            let scraper = match scrapers::build(mode, &config) {
                Ok(scraper) => scraper,
                Err(e) => {
                    ::log::error!("Failed to set up scraper: {}", e);
                    return;
                }
            };

            let mut source = SearchResults::new(&query, &config);
            run_and_persist(
                &mut source,
                scraper.as_ref(),
                &config,
                convert_format(format),
                output,
            )
            .await;
        }

        Command::Batch {
            urls,
            count,
            browser,
            format,
            output,
        } => {
            if let Some(count) = count {
                config.result_target = count;
            } else {
                config.result_target = urls.len();
            }
            let mode = scrape_mode(browser);
            print_webdriver_note(mode, &config);

            let scraper = match scrapers::build(mode, &config) {
                Ok(scraper) => scraper,
                Err(e) => {
                    ::log::error!("Failed to set up scraper: {}", e);
                    return;
                }
            };

            let mut source = UrlList::new(urls);
            run_and_persist(
                &mut source,
                scraper.as_ref(),
                &config,
                convert_format(format),
                output,
            )
            .await;
        }
    }
}

fn scrape_mode(browser: bool) -> ScrapeMode {
    if browser {
        ScrapeMode::Browser
    } else {
        ScrapeMode::Http
    }
}

fn print_webdriver_note(mode: ScrapeMode, config: &ScrapeConfig) {
    if mode == ScrapeMode::Browser {
        println!("Note: Browser scraping requires a WebDriver server (e.g., ChromeDriver).");
        println!(
            "Set WEBDRIVER_URL environment variable if not using the default {}",
            config.webdriver_url
        );
    }
}

fn persist_one(record: &PageRecord, format: OutputFormat, output: Option<PathBuf>) {
    let path = output.unwrap_or_else(|| PathBuf::from(format.default_path()));
    match output::write_record(record, format, &path) {
        Ok(()) => println!("Scraping completed. Output saved to {}", path.display()),
        Err(e) => ::log::error!("Failed to write {}: {}", path.display(), e),
    }
}

async fn run_and_persist(
    source: &mut dyn UrlSource,
    scraper: &dyn PageScraper,
    config: &ScrapeConfig,
    format: OutputFormat,
    output: Option<PathBuf>,
) {
    let start_time = std::time::Instant::now();
    let results = run_batch(source, scraper, config).await;
    ::log::info!(
        "Collected {} records in {:.2} seconds",
        results.len(),
        start_time.elapsed().as_secs_f64()
    );

    if results.is_empty() {
        println!("No results were obtained. Check the logs for error messages.");
        return;
    }

    let path = output.unwrap_or_else(|| PathBuf::from(format.default_path()));
    match output::write_records(&results, format, &path) {
        Ok(()) => println!("Analysis complete. Results saved to {}", path.display()),
        Err(e) => ::log::error!("Failed to write {}: {}", path.display(), e),
    }
}
