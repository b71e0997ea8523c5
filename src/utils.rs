//! Helper functions for content conversion, byline handling, timestamp
//! formatting, and file system validation.

use chrono::DateTime;
use chrono_tz::Tz;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

// Case-insensitive and deliberately lenient: byline links embed addresses in
// mailto: targets with arbitrary casing and query suffixes.
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").unwrap());

static ANY_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Pull an email address out of byline markup.
///
/// Looks at the target of each embedded link and returns the first thing
/// shaped like an address; markup without links yields `None`.
pub fn extract_author_email(author_html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(author_html);
    for link in fragment.select(&ANY_LINK) {
        if let Some(href) = link.value().attr("href") {
            if let Some(found) = EMAIL.find(href) {
                return Some(found.as_str().to_string());
            }
        }
    }
    None
}

/// Render HTML to plain text, 80 columns wide.
pub fn html_to_plain(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 80).unwrap_or_default()
}

/// Collapse a markup fragment to its whitespace-normalized text content.
pub fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().join(" ")
}

/// Timestamp rendering used by the report and the exports.
pub fn format_stamp(stamp: &DateTime<Tz>) -> String {
    stamp.format("%Y-%m-%d kl %H:%M").to_string()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
