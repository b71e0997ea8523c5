//! # Pressklipp
//!
//! A press-clipping crawler that searches a publication's archive for a set
//! of keywords inside a date window, deduplicates the hits across keywords,
//! and renders the aggregated articles as a printable report and tabular
//! exports.
//!
//! ## Usage
//!
//! ```sh
//! pressklipp -k budget -k skatt -a 2024-01-01 -b 2024-02-01 \
//!     -r ./report -e ./export
//! ```
//!
//! ## Architecture
//!
//! One run is a strictly sequential pipeline:
//! 1. **Resolve**: pick the publication adapter by name (fail fast on
//!    unknown names) and build the date window in its home zone
//! 2. **Crawl**: for each keyword in turn, page through the search results
//!    until the window is exhausted, ingesting matched articles into the
//!    URL-keyed store
//! 3. **Output**: write the HTML clip report plus CSV and JSON exports over
//!    the finished store
//!
//! Keywords never run in parallel: politeness toward the remote server is
//! the dominant constraint, not throughput. All fetches share one cached
//! HTTP session with a configurable delay between requests.

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod dates;
mod fetch;
mod models;
mod outputs;
mod pager;
mod publications;
mod utils;

use cli::Cli;
use fetch::CachingFetcher;
use models::{DateWindow, Harvest};
use outputs::{export_rows, json, report, table};
use pager::SearchPager;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("pressklipp starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.publication, ?args.keywords, ?args.after, ?args.before, "Parsed CLI arguments");

    // --- Resolve the publication; unknown names must not start a crawl ---
    let publication = match publications::for_name(&args.publication) {
        Ok(publication) => publication,
        Err(e) => {
            error!(publication = %args.publication, "Unrecognized publication identifier");
            return Err(Box::new(e) as Box<dyn Error>);
        }
    };

    let zone = publication.home_zone();
    let window = DateWindow::from_local_dates(args.after, args.before, zone).ok_or_else(|| {
        error!(after = %args.after, before = %args.before, "Date window is empty or inverted");
        format!("invalid date window [{}, {})", args.after, args.before)
    })?;
    info!(
        publication = publication.name(),
        after = %window.after,
        before = %window.before,
        "Crawl window resolved"
    );

    // Early check: both output dirs must be writable before any fetching
    for dir in [&args.report_output_dir, &args.export_output_dir] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // --- One cached, polite HTTP session for the whole run ---
    let fetcher = CachingFetcher::new(
        Duration::from_millis(args.delay_ms),
        args.proxy.as_deref(),
        &args.cache_dir,
    )?;
    if let Some(proxy) = &args.proxy {
        info!(%proxy, "All requests routed through proxy");
    }

    // ---- Crawl keywords strictly sequentially ----
    let mut harvest = Harvest::default();
    let pager = SearchPager::new(publication.as_ref(), &fetcher, &window);

    let mut aborted_keywords = 0usize;
    for keyword in &args.keywords {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            continue;
        }
        let outcome = pager.run(keyword, &mut harvest).await;
        if outcome.aborted {
            aborted_keywords += 1;
        }
        info!(
            %keyword,
            pages = outcome.pages,
            matched = outcome.matched,
            aborted = outcome.aborted,
            "Keyword done"
        );
    }

    info!(
        articles = harvest.articles.len(),
        keywords = args.keywords.len(),
        aborted_keywords,
        "Crawl complete"
    );

    // ---- Outputs ----
    if let Err(e) = report::write_report(&harvest, publication.name(), &args.report_output_dir).await
    {
        error!(error = %e, "Failed to write clip report");
    }

    let rows = export_rows(&harvest, publication.name());
    if let Err(e) = table::write_table(&rows, publication.name(), &args.export_output_dir).await {
        error!(error = %e, "Failed to write CSV export");
    }
    if let Err(e) = json::write_json(&rows, publication.name(), &args.export_output_dir).await {
        error!(error = %e, "Failed to write JSON export");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        articles = harvest.articles.len(),
        "Execution complete"
    );

    Ok(())
}
