//! CSV export with fixed columns.
//!
//! One row per stored article, in insertion order, with the columns of
//! [`ExportRow`](super::ExportRow). Fields are always quoted so embedded
//! commas, quotes, and the newlines of the plain-text content survive.

use std::error::Error;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

use super::ExportRow;

const HEADER: &str =
    "seq,fetched_at,keywords,publication,created_at,updated_at,author,author_email,url,title,fulltext";

/// Write the rows to `{export_dir}/{date}_{publication}.csv`.
#[instrument(level = "info", skip_all, fields(%export_dir))]
pub async fn write_table(
    rows: &[ExportRow],
    publication: &str,
    export_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let date = chrono::Local::now().date_naive().to_string();
    let path = format!("{export_dir}/{date}_{publication}.csv");

    fs::write(&path, render(rows)).await?;
    info!(path = %path, rows = rows.len(), "Wrote CSV export");
    Ok(())
}

fn render(rows: &[ExportRow]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    for row in rows {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{}",
            row.seq,
            quote(&row.fetched_at),
            quote(&row.keywords),
            quote(&row.publication),
            quote(&row.created_at),
            quote(&row.updated_at),
            quote(&row.author),
            quote(&row.author_email),
            quote(&row.url),
            quote(&row.title),
            quote(&row.fulltext),
        );
    }
    out
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, fulltext: &str) -> ExportRow {
        ExportRow {
            seq: 1,
            fetched_at: "2024-01-16 kl 09:00".into(),
            keywords: "budget, skatt".into(),
            publication: "aftonbladet".into(),
            created_at: "2024-01-15 kl 10:30".into(),
            updated_at: "2024-01-15 kl 12:00".into(),
            author: "Jane Doe".into(),
            author_email: "jane.doe@example.com".into(),
            url: "https://www.aftonbladet.se/nyheter/a/budget1".into(),
            title: title.into(),
            fulltext: fulltext.into(),
        }
    }

    #[test]
    fn test_render_emits_header_and_quoted_rows() {
        let csv = render(&[row("Budgeten klubbad", "Lead.\nBody.")]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(HEADER));
        let body = &csv[HEADER.len() + 1..];
        assert!(body.starts_with("1,\"2024-01-16 kl 09:00\",\"budget, skatt\""));
        // Newlines in the content stay inside the quoted field.
        assert!(body.contains("\"Lead.\nBody.\""));
    }

    #[test]
    fn test_render_escapes_embedded_quotes() {
        let csv = render(&[row("Läget \"allvarligt\"", "text")]);
        assert!(csv.contains("\"Läget \"\"allvarligt\"\"\""));
    }

    #[test]
    fn test_render_empty_rows_is_header_only() {
        assert_eq!(render(&[]), format!("{HEADER}\n"));
    }
}
