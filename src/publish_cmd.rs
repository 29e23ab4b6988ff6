//! `harc publish`: project MongoDB documents into Elasticsearch.

use anyhow::Result;
use harcelement_core::publisher::{publish, PublishOptions};

use crate::config::Config;
use crate::elastic::ElasticIndex;
use crate::mongo::MongoStore;
use crate::progress::{ProgressReporter, StageEvent};

pub async fn run_publish(config: &Config, progress: &dyn ProgressReporter) -> Result<()> {
    let store = MongoStore::connect(&config.store).await?;
    let index = ElasticIndex::new(&config.index)?;

    let options = PublishOptions {
        placeholders: config.index.placeholders.clone(),
        timestamp_field: config.index.timestamp_field().map(str::to_string),
        chunk_size: config.index.bulk_chunk_size,
    };

    let mut rng = rand::thread_rng();
    let report = publish(&store, &index, &options, &mut rng, &mut |n, total| {
        progress.report(StageEvent::writing("publish", n, total))
    })
    .await?;
    index.refresh().await?;
    progress.report(StageEvent::finished("publish", report.bulk.indexed));

    println!(
        "publish: {}.{} → {}",
        config.store.database, config.store.collection, config.index.name
    );
    if report.index_created {
        println!("  index created");
    }
    println!("  documents read:     {}", report.read);
    println!("  documents indexed:  {}", report.bulk.indexed);
    if !report.bulk.failures.is_empty() {
        println!("  failed:             {}", report.bulk.failures.len());
        for failure in report.bulk.failures.iter().take(10) {
            println!("    {}  {}  {}", failure.id, failure.status, failure.reason);
        }
    }
    Ok(())
}
