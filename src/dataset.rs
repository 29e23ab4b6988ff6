//! CSV stage handoff files.
//!
//! Every stage reads a UTF-8 CSV with a header row into a [`Table`] and
//! writes its output the same way. Null cells are written as empty fields.

use anyhow::{Context, Result};
use harcelement_core::table::Table;
use std::fs;
use std::path::Path;

/// Read a CSV file into a [`Table`]. Ragged rows are a schema error.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open dataset: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Failed to read row {} of {}", i + 1, path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let table = Table::from_raw_rows(headers, rows)
        .with_context(|| format!("Invalid dataset: {}", path.display()))?;
    tracing::info!(
        "Loaded {} rows and {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

/// Write a [`Table`] as CSV, creating parent directories as needed.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    writer.write_record(table.column_names())?;
    for i in 0..table.row_count() {
        writer.write_record(table.row(i).iter().map(|cell| cell.render()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Saved {} rows to {}", table.row_count(), path.display());
    Ok(())
}
