//! Publication adapters: the site-specific half of the crawl.
//!
//! Each supported publication implements [`Publication`], which bundles
//! everything the pager needs to know about a site: how to build a search
//! URL for a keyword and page index, how to pull [`SearchItem`]s out of a
//! results page, how to pull lead/body/byline out of an article page, which
//! marker introduces the "updated" half of a listing timestamp, and which
//! timezone undated timestamps belong to.
//!
//! Adapters are resolved by name with [`for_name`]; an unrecognized name is
//! a startup error, never a half-configured crawl.
//!
//! # Supported publications
//!
//! | Name | Module | Notes |
//! |------|--------|-------|
//! | `aftonbladet` | [`aftonbladet`] | sok.aftonbladet.se keyword search |

use chrono_tz::Tz;
use thiserror::Error;

use crate::models::{ArticleParts, SearchItem};

pub mod aftonbladet;

/// No adapter is registered under the requested name.
#[derive(Debug, Error)]
#[error("unknown publication: {0}")]
pub struct UnknownPublication(pub String);

/// Site-specific behavior for one publication.
pub trait Publication {
    /// Identifier used on the command line and in the export columns.
    fn name(&self) -> &'static str;

    /// Timezone attached to listing timestamps that carry no explicit offset.
    fn home_zone(&self) -> Tz;

    /// Marker that introduces the "updated" half of a listing timestamp.
    fn updated_marker(&self) -> &'static str;

    /// Search results URL for `keyword` at `page` (zero-based).
    fn search_url(&self, keyword: &str, page: usize) -> String;

    /// Extract the result entries from a search results page.
    ///
    /// `None` means the page carries no result list container at all, which
    /// signals the end of pagination rather than an error.
    fn extract_items(&self, html: &str) -> Option<Vec<SearchItem>>;

    /// Extract lead, body, and byline markup from an article page.
    fn extract_article(&self, html: &str) -> ArticleParts;
}

/// Resolve a publication adapter by name, failing fast on unknown names.
pub fn for_name(name: &str) -> Result<Box<dyn Publication>, UnknownPublication> {
    match name {
        "aftonbladet" => Ok(Box::new(aftonbladet::Aftonbladet)),
        other => Err(UnknownPublication(other.to_string())),
    }
}
