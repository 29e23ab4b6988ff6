//! `harc load`: bulk-load an enriched CSV into MongoDB.

use anyhow::Result;
use harcelement_core::loader::{load_table, LoadOptions};
use std::path::Path;

use crate::config::Config;
use crate::dataset::read_table;
use crate::mongo::MongoStore;
use crate::progress::{ProgressReporter, StageEvent};

pub async fn run_load(
    config: &Config,
    input: &Path,
    replace: bool,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let table = read_table(input)?;
    let store = MongoStore::connect(&config.store).await?;
    progress.report(StageEvent::started("load", table.row_count()));

    let options = LoadOptions {
        id_field: config.store.id_field.clone(),
        replace,
    };
    let report = load_table(&store, &table, &options).await?;
    progress.report(StageEvent::finished("load", report.inserted));

    println!(
        "load: {} rows → {}.{}",
        report.rows, config.store.database, config.store.collection
    );
    if replace {
        println!("  removed documents:   {}", report.cleared);
    }
    println!("  inserted documents:  {}", report.inserted);
    println!(
        "  '{}' mirrored:  {}",
        config.store.id_field, report.mirrored
    );
    Ok(())
}
