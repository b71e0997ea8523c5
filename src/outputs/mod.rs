//! Output writers over a finished [`Harvest`](crate::models::Harvest).
//!
//! # Submodules
//!
//! - [`report`]: printable HTML clip report, one section per article
//! - [`table`]: CSV export with fixed columns
//! - [`json`]: the same rows as JSON
//!
//! The exports share [`ExportRow`], the fixed-column flat view of an article
//! record: sequence number, fetch timestamp, keyword list, publication,
//! created/updated timestamps, author, author email, URL, title, and the
//! plain-text full content.

use itertools::Itertools;
use serde::Serialize;

use crate::models::Harvest;
use crate::utils::{format_stamp, fragment_text};

pub mod json;
pub mod report;
pub mod table;

/// One article flattened to the fixed export columns.
#[derive(Debug, Serialize)]
pub struct ExportRow {
    pub seq: usize,
    pub fetched_at: String,
    pub keywords: String,
    pub publication: String,
    pub created_at: String,
    pub updated_at: String,
    pub author: String,
    pub author_email: String,
    pub url: String,
    pub title: String,
    pub fulltext: String,
}

/// Flatten the store to export rows, in insertion order.
pub fn export_rows(harvest: &Harvest, publication: &str) -> Vec<ExportRow> {
    harvest
        .articles
        .iter()
        .enumerate()
        .map(|(i, record)| ExportRow {
            seq: i + 1,
            fetched_at: format_stamp(&record.fetched_at),
            keywords: record.keywords.iter().join(", "),
            publication: publication.to_string(),
            created_at: format_stamp(&record.created_at),
            updated_at: format_stamp(&record.updated_at),
            author: record
                .author_html
                .as_deref()
                .map(fragment_text)
                .unwrap_or_default(),
            author_email: record.author_email.clone().unwrap_or_default(),
            url: record.url.clone(),
            title: record.title.clone(),
            fulltext: record.fulltext_plain.clone(),
        })
        .collect()
}
