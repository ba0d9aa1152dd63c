use clap::{Parser, Subcommand, ValueEnum};
use pageprobe::output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pageprobe")]
#[command(about = "Scrapes web pages into structured records, from a URL or a search query")]
#[command(version)]
pub struct Args {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape a single URL into a page record
    Scrape {
        /// URL of the website to scrape
        url: String,

        /// Drive a headless browser session instead of a plain HTTP fetch
        #[arg(long)]
        browser: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        /// Output file name (defaults to output.json / output.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Search the web and scrape the top results
    Search {
        /// Search query
        query: String,

        /// Number of page records to collect
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Drive a headless browser session per result URL
        #[arg(long)]
        browser: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        /// Output file name (defaults to output.json / output.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Scrape a fixed list of URLs in order
    Batch {
        /// URLs to scrape
        #[arg(required = true)]
        urls: Vec<String>,

        /// Number of page records to collect
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Drive a headless browser session per URL
        #[arg(long)]
        browser: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        /// Output file name (defaults to output.json / output.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Csv,
}

/// Convert from the CLI format flag to the output module's format type
pub fn convert_format(arg: FormatArg) -> OutputFormat {
    match arg {
        FormatArg::Json => OutputFormat::Json,
        FormatArg::Csv => OutputFormat::Csv,
    }
}
