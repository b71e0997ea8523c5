//! Paginated traversal of one keyword's search results.
//!
//! The pager walks a publication's result pages in order, applying the
//! date-window stopping rule. Per page visit it commits at most one in-window
//! article before re-fetching at the next index. Listings are assumed
//! date-ordered descending, so the first item older than the window ends the
//! keyword's search entirely.
//!
//! # States
//!
//! Each page visit starts in `Scanning` and resolves to one of:
//! - `Continuing`: an in-window article was found; fetch the next index
//! - `Exhausted` (terminal): no matching items, a stale item, a missing
//!   result list, or a page fetch failure
//!
//! Failure handling follows the error taxonomy: a page fetch failure
//! abandons this keyword only; an article fetch failure (after bounded
//! retry) excludes that single article and the walk continues.

use tracing::{debug, info, instrument, warn};

use crate::dates;
use crate::fetch::{Fetch, fetch_with_backoff};
use crate::models::{DateWindow, Harvest, SearchItem};
use crate::publications::Publication;

/// Outcome of one page scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagerState {
    Continuing,
    Exhausted,
}

/// What one keyword's traversal amounted to, for the run summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct PagerOutcome {
    /// Result pages fetched.
    pub pages: usize,
    /// Articles committed to the store (new records and keyword unions).
    pub matched: usize,
    /// Whether the traversal ended on a page fetch failure rather than a
    /// normal exhaustion of the window.
    pub aborted: bool,
}

/// Drives one keyword at a time through a publication's search pages.
pub struct SearchPager<'a, F> {
    publication: &'a dyn Publication,
    fetcher: &'a F,
    window: &'a DateWindow,
}

impl<'a, F: Fetch> SearchPager<'a, F> {
    pub fn new(publication: &'a dyn Publication, fetcher: &'a F, window: &'a DateWindow) -> Self {
        Self {
            publication,
            fetcher,
            window,
        }
    }

    /// Walk `keyword`'s result pages until the window is exhausted.
    #[instrument(level = "info", skip_all, fields(%keyword))]
    pub async fn run(&self, keyword: &str, harvest: &mut Harvest) -> PagerOutcome {
        let mut outcome = PagerOutcome::default();
        let mut page = 0usize;

        loop {
            let page_url = self.publication.search_url(keyword, page);
            let html = match self.fetcher.fetch(&page_url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(%page_url, error = %e, "Page fetch failed; abandoning keyword");
                    outcome.aborted = true;
                    break;
                }
            };
            outcome.pages += 1;

            let Some(items) = self.publication.extract_items(&html) else {
                debug!(page, "No result list; end of pagination");
                break;
            };

            match self.scan_page(&items, keyword, harvest, &mut outcome).await {
                PagerState::Continuing => page += 1,
                PagerState::Exhausted => break,
            }
        }

        info!(
            pages = outcome.pages,
            matched = outcome.matched,
            aborted = outcome.aborted,
            "Keyword traversal finished"
        );
        outcome
    }

    /// Scan one page's items in listing order. `Exhausted` unless an
    /// in-window article turns up.
    async fn scan_page(
        &self,
        items: &[SearchItem],
        keyword: &str,
        harvest: &mut Harvest,
        outcome: &mut PagerOutcome,
    ) -> PagerState {
        let zone = self.publication.home_zone();
        let marker = self.publication.updated_marker();

        for item in items {
            if !item.is_article {
                continue;
            }

            let Some((created, updated)) = dates::created_updated(&item.raw_timestamp, marker, zone)
            else {
                debug!(url = %item.url, raw = %item.raw_timestamp, "Timestamp unavailable; item skipped");
                continue;
            };

            if created < self.window.after {
                // Listings are newest-first: one stale item ends the keyword.
                debug!(url = %item.url, %created, "Stale item; keyword exhausted");
                return PagerState::Exhausted;
            }

            if self.window.contains(&created) {
                outcome.matched += 1;
                if harvest.note_match(&item.url, keyword) {
                    return PagerState::Continuing;
                }
                match fetch_with_backoff(self.fetcher, &item.url).await {
                    Ok(article_html) => {
                        let parts = self.publication.extract_article(&article_html);
                        harvest.ingest(
                            &item.url,
                            &item.title,
                            created,
                            updated,
                            keyword,
                            &parts.lead_html,
                            &parts.body_html,
                            parts.author_html.as_deref(),
                        );
                    }
                    Err(e) => {
                        outcome.matched -= 1;
                        warn!(url = %item.url, error = %e, "Article fetch failed; article excluded");
                    }
                }
                // One committed match per page visit; re-fetch at next index.
                return PagerState::Continuing;
            }

            // created >= before: too recent, older siblings may still qualify.
        }

        PagerState::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::models::DateWindow;
    use crate::publications::{self, Publication};
    use chrono::NaiveDate;
    use chrono_tz::Europe::Stockholm;
    use reqwest::StatusCode;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned bodies by exact URL and logs every fetch.
    struct StubFetch {
        pages: HashMap<String, String>,
        log: RefCell<Vec<String>>,
    }

    impl StubFetch {
        fn new(pages: Vec<(String, String)>) -> Self {
            Self {
                pages: pages.into_iter().collect(),
                log: RefCell::new(Vec::new()),
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    impl Fetch for StubFetch {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.log.borrow_mut().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: StatusCode::NOT_FOUND,
                })
        }
    }

    const EMPTY_PAGE: &str = "<html><body><p>Inga träffar</p></body></html>";

    fn search_page(items: &[(&str, &str, &str)]) -> String {
        let mut lis = String::new();
        for (href, title, stamp) in items {
            lis.push_str(&format!(
                r#"<li><a href="{href}">{title}</a><span class="resultInfo">Nyheter</span><span>{stamp}</span></li>"#
            ));
        }
        format!(r#"<html><body><ol id="searchResultList">{lis}</ol></body></html>"#)
    }

    fn article_page(lead: &str) -> String {
        format!(
            r#"<html><body>
            <div class="abLeadText"><p>{lead}</p></div>
            <div class="abBodyText"><p>Brödtext.</p></div>
            <address><a href="mailto:jane.doe@example.com">Jane Doe</a></address>
            </body></html>"#
        )
    }

    fn window_jan_2024() -> DateWindow {
        DateWindow::from_local_dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            Stockholm,
        )
        .unwrap()
    }

    fn publication() -> Box<dyn Publication> {
        publications::for_name("aftonbladet").unwrap()
    }

    #[tokio::test]
    async fn test_two_page_scenario_ingests_one_record() {
        let publication = publication();
        let window = window_jan_2024();
        let article_url = "https://www.aftonbladet.se/nyheter/a/budget1";

        let fetcher = StubFetch::new(vec![
            (
                publication.search_url("budget", 0),
                search_page(&[(
                    article_url,
                    "Budgeten klubbad",
                    "2024-01-15 kl 10.30 (uppdaterad 2024-01-15 kl 12.00)",
                )]),
            ),
            (
                publication.search_url("budget", 1),
                search_page(&[(
                    "https://www.aftonbladet.se/nyheter/a/gammal",
                    "Fjolårets budget",
                    "2023-11-02 kl 08.00 (uppdaterad 2023-11-02 kl 08.30)",
                )]),
            ),
            (article_url.to_string(), article_page("Budgeten.")),
        ]);

        let mut harvest = Harvest::default();
        let pager = SearchPager::new(publication.as_ref(), &fetcher, &window);
        let outcome = pager.run("budget", &mut harvest).await;

        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.matched, 1);
        assert!(!outcome.aborted);
        assert_eq!(harvest.articles.len(), 1);
        assert_eq!(harvest.keywords.urls_for("budget"), [article_url]);

        let record = harvest.articles.get(article_url).unwrap();
        assert_eq!(record.title, "Budgeten klubbad");
        assert_eq!(record.author_email.as_deref(), Some("jane.doe@example.com"));

        // Page 0, the article, page 1, and nothing beyond.
        assert_eq!(
            fetcher.fetched(),
            [
                publication.search_url("budget", 0),
                article_url.to_string(),
                publication.search_url("budget", 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_stale_item_short_circuits_the_keyword() {
        let publication = publication();
        let window = window_jan_2024();

        let fetcher = StubFetch::new(vec![(
            publication.search_url("budget", 0),
            search_page(&[
                (
                    "https://www.aftonbladet.se/nyheter/a/stale",
                    "För gammal",
                    "2023-12-01 kl 10.00 (uppdaterad 2023-12-01 kl 10.30)",
                ),
                (
                    "https://www.aftonbladet.se/nyheter/a/older",
                    "Ännu äldre",
                    "2023-06-01 kl 10.00 (uppdaterad 2023-06-01 kl 10.30)",
                ),
            ]),
        )]);

        let mut harvest = Harvest::default();
        let pager = SearchPager::new(publication.as_ref(), &fetcher, &window);
        let outcome = pager.run("budget", &mut harvest).await;

        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.matched, 0);
        assert!(harvest.articles.is_empty());
        // Only page 0 was ever fetched: no article fetches, no page 1.
        assert_eq!(fetcher.fetched(), [publication.search_url("budget", 0)]);
    }

    #[tokio::test]
    async fn test_too_recent_items_are_skipped_not_terminal() {
        let publication = publication();
        let window = window_jan_2024();
        let article_url = "https://www.aftonbladet.se/nyheter/a/traff";

        let fetcher = StubFetch::new(vec![
            (
                publication.search_url("budget", 0),
                search_page(&[
                    (
                        "https://www.aftonbladet.se/nyheter/a/senare",
                        "För färsk",
                        "2024-03-05 kl 10.00 (uppdaterad 2024-03-05 kl 10.30)",
                    ),
                    (
                        article_url,
                        "I fönstret",
                        "2024-01-20 kl 10.00 (uppdaterad 2024-01-20 kl 10.30)",
                    ),
                ]),
            ),
            (publication.search_url("budget", 1), EMPTY_PAGE.to_string()),
            (article_url.to_string(), article_page("Träff.")),
        ]);

        let mut harvest = Harvest::default();
        let pager = SearchPager::new(publication.as_ref(), &fetcher, &window);
        let outcome = pager.run("budget", &mut harvest).await;

        assert_eq!(outcome.matched, 1);
        assert_eq!(harvest.articles.len(), 1);
        assert!(harvest.articles.contains(article_url));
        assert_eq!(outcome.pages, 2);
    }

    #[tokio::test]
    async fn test_unparseable_timestamp_excludes_item_from_matching() {
        let publication = publication();
        let window = window_jan_2024();

        let fetcher = StubFetch::new(vec![(
            publication.search_url("budget", 0),
            search_page(&[(
                "https://www.aftonbladet.se/nyheter/a/oklar",
                "Utan tidsstämpel",
                "i dag", // no marker, no parseable date
            )]),
        )]);

        let mut harvest = Harvest::default();
        let pager = SearchPager::new(publication.as_ref(), &fetcher, &window);
        let outcome = pager.run("budget", &mut harvest).await;

        assert_eq!(outcome.matched, 0);
        assert!(harvest.articles.is_empty());
        assert!(!outcome.aborted);
    }

    #[tokio::test]
    async fn test_page_fetch_failure_abandons_keyword_only() {
        let publication = publication();
        let window = window_jan_2024();

        let fetcher = StubFetch::new(vec![]);
        let mut harvest = Harvest::default();
        let pager = SearchPager::new(publication.as_ref(), &fetcher, &window);
        let outcome = pager.run("budget", &mut harvest).await;

        assert!(outcome.aborted);
        assert_eq!(outcome.pages, 0);
        assert!(harvest.articles.is_empty());
    }

    #[tokio::test]
    async fn test_article_fetch_failure_excludes_article_but_continues() {
        let publication = publication();
        let window = window_jan_2024();

        let fetcher = StubFetch::new(vec![
            (
                publication.search_url("budget", 0),
                search_page(&[(
                    "https://www.aftonbladet.se/nyheter/a/borta",
                    "Försvunnen artikel",
                    "2024-01-10 kl 10.00 (uppdaterad 2024-01-10 kl 10.30)",
                )]),
            ),
            // The article URL itself 404s; page 1 ends the walk.
            (publication.search_url("budget", 1), EMPTY_PAGE.to_string()),
        ]);

        let mut harvest = Harvest::default();
        let pager = SearchPager::new(publication.as_ref(), &fetcher, &window);
        let outcome = pager.run("budget", &mut harvest).await;

        assert_eq!(outcome.matched, 0);
        assert!(harvest.articles.is_empty());
        assert_eq!(outcome.pages, 2);
        assert!(!outcome.aborted);
    }

    #[tokio::test]
    async fn test_same_url_under_two_keywords_fetches_once() {
        let publication = publication();
        let window = window_jan_2024();
        let article_url = "https://www.aftonbladet.se/nyheter/a/delad";
        let listing = search_page(&[(
            article_url,
            "Delad träff",
            "2024-01-15 kl 10.30 (uppdaterad 2024-01-15 kl 12.00)",
        )]);

        let fetcher = StubFetch::new(vec![
            (publication.search_url("budget", 0), listing.clone()),
            (publication.search_url("budget", 1), EMPTY_PAGE.to_string()),
            (publication.search_url("skatt", 0), listing),
            (publication.search_url("skatt", 1), EMPTY_PAGE.to_string()),
            (article_url.to_string(), article_page("Delad.")),
        ]);

        let mut harvest = Harvest::default();
        let pager = SearchPager::new(publication.as_ref(), &fetcher, &window);
        pager.run("budget", &mut harvest).await;
        pager.run("skatt", &mut harvest).await;

        assert_eq!(harvest.articles.len(), 1);
        let record = harvest.articles.get(article_url).unwrap();
        assert!(record.keywords.contains("budget"));
        assert!(record.keywords.contains("skatt"));
        assert_eq!(harvest.keywords.urls_for("budget"), [article_url]);
        assert_eq!(harvest.keywords.urls_for("skatt"), [article_url]);

        let article_fetches = fetcher
            .fetched()
            .iter()
            .filter(|u| *u == article_url)
            .count();
        assert_eq!(article_fetches, 1);
    }
}
