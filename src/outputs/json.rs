//! JSON export.
//!
//! Serializes the same fixed-column rows as the CSV export, for consumers
//! that want structure rather than a spreadsheet.

use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

use super::ExportRow;

/// Write the rows to `{export_dir}/{date}_{publication}.json`.
#[instrument(level = "info", skip_all, fields(%export_dir))]
pub async fn write_json(
    rows: &[ExportRow],
    publication: &str,
    export_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(rows)?;

    let date = chrono::Local::now().date_naive().to_string();
    let path = format!("{export_dir}/{date}_{publication}.json");

    fs::write(&path, json).await?;
    info!(path = %path, rows = rows.len(), "Wrote JSON export");
    Ok(())
}
