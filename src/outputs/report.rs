//! Printable HTML clip report.
//!
//! One document per run: a summary table of keywords and their match counts,
//! then one section per article: a metadata table (Titel, Skapad, Senast
//! uppdaterad, Källa, Hämtad, Nyckelord) followed by the article's lead,
//! body, and byline markup, each section ending on a page break so the
//! report prints one clip per sheet.

use itertools::Itertools;
use std::error::Error;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::Harvest;
use crate::utils::format_stamp;

/// Write the clip report to `{report_dir}/{date}_{publication}.html`.
#[instrument(level = "info", skip_all, fields(%report_dir))]
pub async fn write_report(
    harvest: &Harvest,
    publication: &str,
    report_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let date = chrono::Local::now().date_naive().to_string();
    let path = format!("{report_dir}/{date}_{publication}.html");
    let html = render(harvest, publication, &date);

    fs::write(&path, html).await?;
    info!(path = %path, articles = harvest.articles.len(), "Wrote clip report");
    Ok(())
}

fn render(harvest: &Harvest, publication: &str, date: &str) -> String {
    let mut out = String::new();

    out.push_str("<meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\" />");
    let _ = write!(
        out,
        "<head><title>Pressklipp {publication} {date}</title></head><body>"
    );

    // Keyword summary from the index, one row per search term.
    let _ = write!(
        out,
        "<h1>Pressklipp: {publication}</h1>\
         <table CELLPADDING=6 RULES=GROUPS FRAME=BOX>\
         <tr><td><b>Sökord</b></td><td><b>Träffar</b></td></tr>"
    );
    for (keyword, urls) in harvest.keywords.iter() {
        let _ = write!(out, "<tr><td>{keyword}</td><td>{}</td></tr>", urls.len());
    }
    out.push_str("</table>");

    for record in harvest.articles.iter() {
        let keywords = record.keywords.iter().join(", ");
        let _ = write!(
            out,
            "<table CELLPADDING=6 RULES=GROUPS FRAME=BOX>\
             <tr><td>Titel:</td><td>{title}</td></tr>\
             <tr><td>Skapad:</td><td>{created}</td></tr>\
             <tr><td>Senast uppdaterad:</td><td>{updated}</td></tr>\
             <tr><td>Källa:</td><td><i>{url}</i></td></tr>\
             <tr><td>Hämtad:</td><td>{fetched}</td></tr>\
             <tr><td>Nyckelord:</td><td>{keywords}</td></tr>\
             </table>",
            title = record.title,
            created = format_stamp(&record.created_at),
            updated = format_stamp(&record.updated_at),
            url = record.url,
            fetched = format_stamp(&record.fetched_at),
        );
        out.push_str(&record.lead_html);
        out.push_str(&record.body_html);
        if let Some(author) = &record.author_html {
            out.push_str(author);
        }
        out.push_str("<p style=\"page-break-before: always\">");
    }

    out.push_str("</body>");
    out
}
