//! Bulk-load a [`Table`] into a [`DocumentStore`].
//!
//! One insert call writes every row, then one update call copies each new
//! document's id into the mirrored field. A failure in either call aborts
//! the load; documents already inserted stay in the store. Loading the same
//! table twice stores every row twice unless `replace` is set.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::store::DocumentStore;
use crate::table::Table;

pub const DEFAULT_ID_FIELD: &str = "Id_Post";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field that receives a copy of the generated id.
    pub id_field: String,
    /// Delete every existing document before inserting.
    pub replace: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            replace: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows: usize,
    pub cleared: u64,
    pub inserted: usize,
    pub mirrored: u64,
}

pub async fn load_table(
    store: &dyn DocumentStore,
    table: &Table,
    options: &LoadOptions,
) -> Result<LoadReport> {
    let mut report = LoadReport {
        rows: table.row_count(),
        ..LoadReport::default()
    };

    if options.replace {
        report.cleared = store.clear().await.context("failed to clear collection")?;
        tracing::info!("Removed {} existing documents", report.cleared);
    }

    if table.row_count() == 0 {
        tracing::warn!("Dataset has no rows; nothing to insert");
        return Ok(report);
    }
    if table.has_column(&options.id_field) {
        tracing::warn!(
            "Column '{}' exists and will be overwritten with document ids",
            options.id_field
        );
    }

    let ids = store
        .insert_many(table.records())
        .await
        .context("failed to insert documents")?;
    report.inserted = ids.len();
    tracing::info!("Inserted {} documents", report.inserted);

    report.mirrored = store
        .mirror_ids(&ids, &options.id_field)
        .await
        .with_context(|| format!("failed to add '{}' to inserted documents", options.id_field))?;
    tracing::info!("Added '{}' field to {} documents", options.id_field, report.mirrored);

    Ok(report)
}
