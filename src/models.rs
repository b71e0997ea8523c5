//! Data model for a crawl run: the article store, the keyword index, and the
//! transient types that flow between the pager and the publication adapter.
//!
//! The central pieces are:
//! - [`ArticleRecord`]: one aggregated article per distinct URL
//! - [`Harvest`]: the run-owned pair of [`ArticleStore`] and [`KeywordIndex`]
//! - [`SearchItem`]: a single entry on a search results page, never persisted
//! - [`DateWindow`]: the half-open `[after, before)` interval bounding a run
//!
//! Ingestion is idempotent with respect to content and monotonic with respect
//! to keyword coverage: the first ingestion of a URL fixes every field except
//! `keywords`, and later matches (other keywords, repeated page visits) only
//! union into that set.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::utils::{extract_author_email, html_to_plain};

/// One entry extracted from a search results page.
///
/// Produced by a publication adapter's `extract_items` and consumed
/// immediately by the pager; search items are never stored.
#[derive(Debug, Clone)]
pub struct SearchItem {
    /// Link target of the result entry.
    pub url: String,
    /// Link text of the result entry.
    pub title: String,
    /// Raw `"<created> (uppdaterad <updated>)"` fragment, unparsed.
    pub raw_timestamp: String,
    /// Whether the listing classifies this entry as an article
    /// (as opposed to video clips, galleries, and other result types).
    pub is_article: bool,
}

/// Content sections extracted from a single article page.
#[derive(Debug, Clone, Default)]
pub struct ArticleParts {
    pub lead_html: String,
    pub body_html: String,
    /// Byline markup, when the page carries one.
    pub author_html: Option<String>,
}

/// The half-open date window `[after, before)` for a run.
///
/// Both bounds are instants in the publication's home zone; an article
/// qualifies when `after <= created < before`.
#[derive(Debug, Clone)]
pub struct DateWindow {
    pub after: DateTime<Tz>,
    pub before: DateTime<Tz>,
}

impl DateWindow {
    /// Build a window from two local calendar dates, each taken at midnight
    /// in `zone`. Returns `None` for an empty or inverted window, or when a
    /// bound falls into a nonexistent local time.
    pub fn from_local_dates(after: NaiveDate, before: NaiveDate, zone: Tz) -> Option<Self> {
        use chrono::TimeZone;
        let after = zone
            .from_local_datetime(&after.and_hms_opt(0, 0, 0)?)
            .earliest()?;
        let before = zone
            .from_local_datetime(&before.and_hms_opt(0, 0, 0)?)
            .earliest()?;
        (after < before).then_some(Self { after, before })
    }

    pub fn contains(&self, instant: &DateTime<Tz>) -> bool {
        *instant >= self.after && *instant < self.before
    }
}

/// One aggregated article, keyed by canonical URL.
///
/// Every field except `keywords` is fixed by the first ingestion of the URL.
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub created_at: DateTime<Tz>,
    pub updated_at: DateTime<Tz>,
    /// When the article body was first fetched.
    pub fetched_at: DateTime<Tz>,
    /// Union of all keywords that ever matched this URL.
    pub keywords: BTreeSet<String>,
    pub lead_html: String,
    pub body_html: String,
    pub author_html: Option<String>,
    /// Address of the byline's embedded link, when one is present.
    pub author_email: Option<String>,
    /// Plain-text rendering of lead + body, derived once at ingestion.
    pub fulltext_plain: String,
}

/// URL-keyed, insertion-ordered collection of [`ArticleRecord`]s.
#[derive(Debug, Default)]
pub struct ArticleStore {
    records: HashMap<String, ArticleRecord>,
    order: Vec<String>,
}

impl ArticleStore {
    pub fn contains(&self, url: &str) -> bool {
        self.records.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&ArticleRecord> {
        self.records.get(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records in first-ingested order.
    pub fn iter(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.order.iter().filter_map(|url| self.records.get(url))
    }

    fn add_keyword(&mut self, url: &str, keyword: &str) {
        if let Some(record) = self.records.get_mut(url) {
            record.keywords.insert(keyword.to_string());
        }
    }

    fn insert(&mut self, record: ArticleRecord) {
        self.order.push(record.url.clone());
        self.records.insert(record.url.clone(), record);
    }
}

/// Keyword -> distinct matched URLs, in match order.
///
/// Kept separate from the article store: a URL appears here once per keyword
/// that matched it while backing a single [`ArticleRecord`]. Used only for
/// the run summary.
#[derive(Debug, Default)]
pub struct KeywordIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl KeywordIndex {
    pub fn record(&mut self, keyword: &str, url: &str) {
        let urls = self.entries.entry(keyword.to_string()).or_default();
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }

    pub fn urls_for(&self, keyword: &str) -> &[String] {
        self.entries.get(keyword).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }
}

/// Everything a crawl run accumulates: the article store plus the keyword
/// index. Owned by the run, mutated only by the pager.
#[derive(Debug, Default)]
pub struct Harvest {
    pub articles: ArticleStore,
    pub keywords: KeywordIndex,
}

impl Harvest {
    /// Record a match against a URL that is already stored, without
    /// refetching anything. Returns `false` when the URL is unknown and a
    /// full [`Harvest::ingest`] is required.
    pub fn note_match(&mut self, url: &str, keyword: &str) -> bool {
        if !self.articles.contains(url) {
            return false;
        }
        self.articles.add_keyword(url, keyword);
        self.keywords.record(keyword, url);
        debug!(%url, %keyword, "Known URL matched again; keyword unioned");
        true
    }

    /// Ingest one matched article.
    ///
    /// For a URL already in the store this unions `keyword` into its keyword
    /// set and touches nothing else. Otherwise the byline email and the
    /// plain-text rendering are derived and a new record is inserted. In both
    /// cases the URL is recorded in the keyword index under `keyword`.
    #[allow(clippy::too_many_arguments)]
    pub fn ingest(
        &mut self,
        url: &str,
        title: &str,
        created: DateTime<Tz>,
        updated: DateTime<Tz>,
        keyword: &str,
        lead_html: &str,
        body_html: &str,
        author_html: Option<&str>,
    ) {
        if self.articles.contains(url) {
            self.articles.add_keyword(url, keyword);
        } else {
            let author_email = author_html.and_then(extract_author_email);
            let fulltext_plain = html_to_plain(&format!("{lead_html}{body_html}"));
            let record = ArticleRecord {
                url: url.to_string(),
                title: title.to_string(),
                created_at: created,
                updated_at: updated,
                fetched_at: Utc::now().with_timezone(&created.timezone()),
                keywords: BTreeSet::from([keyword.to_string()]),
                lead_html: lead_html.to_string(),
                body_html: body_html.to_string(),
                author_html: author_html.map(str::to_string),
                author_email,
                fulltext_plain,
            };
            debug!(%url, %keyword, title, "New article ingested");
            self.articles.insert(record);
        }
        self.keywords.record(keyword, url);
    }
}
