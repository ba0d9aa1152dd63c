use crate::error::ScrapeError;
use crate::record::{Links, MetaTags, PageRecord};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Supported persistence formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    /// Default output filename for the format
    pub fn default_path(self) -> &'static str {
        match self {
            OutputFormat::Json => "output.json",
            OutputFormat::Csv => "output.csv",
        }
    }
}

/// For library callers holding a format name as a string. The CLI validates
/// `--format` through its own value enum before this could be reached.
impl FromStr for OutputFormat {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(ScrapeError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Persists a single record (the single-URL CLI path)
pub fn write_record<P: AsRef<Path>>(
    record: &PageRecord,
    format: OutputFormat,
    path: P,
) -> Result<(), ScrapeError> {
    match format {
        OutputFormat::Json => {
            fs::write(path, serde_json::to_string_pretty(record)?)?;
        }
        OutputFormat::Csv => {
            fs::write(path, to_csv(std::slice::from_ref(record)))?;
        }
    }
    Ok(())
}

/// Persists a batch of records as a JSON array or concatenated CSV rows
pub fn write_records<P: AsRef<Path>>(
    records: &[PageRecord],
    format: OutputFormat,
    path: P,
) -> Result<(), ScrapeError> {
    match format {
        OutputFormat::Json => {
            fs::write(path, serde_json::to_string_pretty(records)?)?;
        }
        OutputFormat::Csv => {
            fs::write(path, to_csv(records))?;
        }
    }
    Ok(())
}

/// CSV layout: header `Section,Content`, then one row per (field, item)
/// pair. Scalar fields take one row, list and map fields one row per
/// element — so an empty list contributes no rows at all — and non-string
/// items are JSON-encoded in the Content column.
fn to_csv(records: &[PageRecord]) -> String {
    let mut out = String::from("Section,Content\n");
    for record in records {
        for (section, content) in record_rows(record) {
            out.push_str(&csv_field(section));
            out.push(',');
            out.push_str(&csv_field(&content));
            out.push('\n');
        }
    }
    out
}

fn record_rows(record: &PageRecord) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();

    rows.push(("url", record.url.clone()));
    rows.push(("title", record.title.clone().unwrap_or_default()));

    match &record.meta_tags {
        MetaTags::Map(map) => {
            for (name, content) in map {
                rows.push((
                    "meta_tags",
                    serde_json::json!({ "name": name, "content": content }).to_string(),
                ));
            }
        }
        MetaTags::List(list) => {
            for tag in list {
                rows.push(("meta_tags", json_row(tag)));
            }
        }
    }

    for block in &record.content {
        rows.push(("content", json_row(block)));
    }
    for nav in &record.navigation_links {
        rows.push(("navigation_links", json_row(nav)));
    }

    match &record.links {
        Links::Detailed(links) => {
            for link in links {
                rows.push(("links", json_row(link)));
            }
        }
        Links::Plain(urls) => {
            for url in urls {
                rows.push(("links", url.clone()));
            }
        }
    }

    for image in &record.images {
        rows.push(("images", json_row(image)));
    }
    for video in &record.videos {
        rows.push(("videos", json_row(video)));
    }
    for value in &record.structured_data {
        rows.push(("structured_data", value.to_string()));
    }
    for (property, content) in &record.open_graph {
        rows.push((
            "open_graph",
            serde_json::json!({ "property": property, "content": content }).to_string(),
        ));
    }

    rows
}

fn json_row<T: serde::Serialize>(item: &T) -> String {
    // Serialization of these record types cannot fail
    serde_json::to_string(item).unwrap_or_default()
}

/// Quotes a field when it contains a delimiter, quote, or line break,
/// doubling any embedded quotes
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
