//! Command-line interface definitions for pressklipp.
//!
//! All options can be provided via command-line flags; the proxy endpoint
//! can also come from the environment.

use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for a crawl run.
///
/// # Examples
///
/// ```sh
/// # One keyword, one month of articles
/// pressklipp -k budget -a 2024-01-01 -b 2024-02-01 -r ./report -e ./export
///
/// # Several keywords through a proxy, slower pacing
/// pressklipp -k budget -k skatt --delay-ms 2000 \
///     --proxy socks5://127.0.0.1:9050 \
///     -a 2024-01-01 -b 2024-02-01 -r ./report -e ./export
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Publication to search
    #[arg(short, long, default_value = "aftonbladet")]
    pub publication: String,

    /// Keyword to search for (repeat for several)
    #[arg(short, long = "keyword", required = true)]
    pub keywords: Vec<String>,

    /// Include articles created on or after this date (inclusive)
    #[arg(short, long)]
    pub after: NaiveDate,

    /// Include articles created before this date (exclusive)
    #[arg(short, long)]
    pub before: NaiveDate,

    /// Politeness delay between requests, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Proxy endpoint for all outbound requests
    #[arg(long, env = "PRESSKLIPP_PROXY")]
    pub proxy: Option<String>,

    /// Directory for the HTTP response cache
    #[arg(long, default_value = "./http-cacache")]
    pub cache_dir: String,

    /// Output directory for the HTML clip report
    #[arg(short, long)]
    pub report_output_dir: String,

    /// Output directory for the CSV and JSON exports
    #[arg(short, long)]
    pub export_output_dir: String,
}
