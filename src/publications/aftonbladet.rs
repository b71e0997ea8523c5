//! Aftonbladet search adapter.
//!
//! Drives the keyword search at `sok.aftonbladet.se`, sorted by publication
//! date so the pager's stale-item stopping rule holds. Result pages carry an
//! `ol#searchResultList`; each `li` links the hit and labels it with a
//! category span, where the `resultInfo` class marks a real article entry
//! (other result types are video clips and galleries). The second span holds
//! the `"<created> (uppdaterad <updated>)"` fragment.
//!
//! Article pages are the classic markup: lead in `div.abLeadText`, body in
//! one or more `div.abBodyText`, byline in an `address` element.

use chrono_tz::Tz;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::Publication;
use crate::models::{ArticleParts, SearchItem};

const SEARCH_BASE: &str = "http://sok.aftonbladet.se/";

static RESULT_LIST: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ol#searchResultList").unwrap());
static RESULT_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static ITEM_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static ITEM_SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").unwrap());
static LEAD: Lazy<Selector> = Lazy::new(|| Selector::parse("div.abLeadText").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("div.abBodyText").unwrap());
static BYLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("address").unwrap());
static SEARCH_BASE_URL: Lazy<Url> = Lazy::new(|| Url::parse(SEARCH_BASE).unwrap());

pub struct Aftonbladet;

impl Aftonbladet {
    /// A listing entry is an article when its category span carries the
    /// `resultInfo` class.
    fn is_article_entry(item: &ElementRef<'_>) -> bool {
        item.select(&ITEM_SPAN)
            .next()
            .map(|span| span.value().classes().any(|c| c == "resultInfo"))
            .unwrap_or(false)
    }
}

impl Publication for Aftonbladet {
    fn name(&self) -> &'static str {
        "aftonbladet"
    }

    fn home_zone(&self) -> Tz {
        chrono_tz::Europe::Stockholm
    }

    fn updated_marker(&self) -> &'static str {
        "(uppdaterad"
    }

    fn search_url(&self, keyword: &str, page: usize) -> String {
        format!(
            "{SEARCH_BASE}?sortBy=pubDate&q={}&page={page}",
            urlencoding::encode(keyword)
        )
    }

    fn extract_items(&self, html: &str) -> Option<Vec<SearchItem>> {
        let document = Html::parse_document(html);
        let list = document.select(&RESULT_LIST).next()?;

        let mut items = Vec::new();
        for li in list.select(&RESULT_ITEM) {
            let Some(link) = li.select(&ITEM_LINK).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Ok(resolved) = SEARCH_BASE_URL.join(href.trim()) else {
                continue;
            };

            let title = link.text().collect::<Vec<_>>().join(" ").trim().to_string();
            let raw_timestamp = li
                .select(&ITEM_SPAN)
                .nth(1)
                .map(|span| span.text().collect::<Vec<_>>().join(" ").trim().to_string())
                .unwrap_or_default();

            items.push(SearchItem {
                url: resolved.to_string(),
                title,
                raw_timestamp,
                is_article: Self::is_article_entry(&li),
            });
        }
        debug!(count = items.len(), "Extracted search items");
        Some(items)
    }

    fn extract_article(&self, html: &str) -> ArticleParts {
        let document = Html::parse_document(html);

        let lead_html = document
            .select(&LEAD)
            .next()
            .map(|el| el.html())
            .unwrap_or_default();
        let body_html = document
            .select(&BODY)
            .map(|el| el.html())
            .collect::<String>();
        let author_html = document.select(&BYLINE).next().map(|el| el.html());

        ArticleParts {
            lead_html,
            body_html,
            author_html,
        }
    }
}
