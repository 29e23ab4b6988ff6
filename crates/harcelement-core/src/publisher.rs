//! Publish stored documents into a [`SearchIndex`].
//!
//! The index is created with the fixed mapping if needed, every document is
//! read from the store, projected into an [`IndexRecord`] and written in
//! bulk chunks keyed by the store id. Rejected records are reported, not
//! retried. Publishing again overwrites by id.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rand::Rng;
use serde::Serialize;

use crate::index::{build_index_record, ensure_index, BulkReport, IndexRecord, Placeholders, SearchIndex};
use crate::store::DocumentStore;

pub const DEFAULT_BULK_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct PublishOptions {
    pub placeholders: Placeholders,
    /// Stored field holding a real timestamp.
    pub timestamp_field: Option<String>,
    pub chunk_size: usize,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            placeholders: Placeholders::default(),
            timestamp_field: None,
            chunk_size: DEFAULT_BULK_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublishReport {
    pub index_created: bool,
    pub read: usize,
    #[serde(flatten)]
    pub bulk: BulkReport,
}

/// Called after each bulk chunk with (records written so far, total).
pub type ChunkCallback<'a> = dyn FnMut(usize, usize) + Send + 'a;

pub async fn publish<R: Rng + ?Sized>(
    store: &dyn DocumentStore,
    index: &dyn SearchIndex,
    options: &PublishOptions,
    rng: &mut R,
    on_chunk: &mut ChunkCallback<'_>,
) -> Result<PublishReport> {
    if options.chunk_size == 0 {
        bail!("bulk chunk size must be at least 1");
    }

    let mut report = PublishReport {
        index_created: ensure_index(index)
            .await
            .with_context(|| format!("failed to prepare index '{}'", index.name()))?,
        ..PublishReport::default()
    };

    let docs = store.find_all().await.context("failed to read documents")?;
    report.read = docs.len();
    tracing::info!("Read {} documents from store", report.read);

    let now = Utc::now();
    let records: Vec<(String, IndexRecord)> = docs
        .iter()
        .map(|doc| {
            let record = build_index_record(
                doc,
                &options.placeholders,
                options.timestamp_field.as_deref(),
                now,
                rng,
            );
            (doc.id.clone(), record)
        })
        .collect();

    let mut done = 0;
    for chunk in records.chunks(options.chunk_size) {
        let result = index
            .bulk_index(chunk)
            .await
            .with_context(|| format!("bulk write to index '{}' failed", index.name()))?;
        for failure in &result.failures {
            tracing::warn!(
                "Document {} rejected ({}): {}",
                failure.id,
                failure.status,
                failure.reason
            );
        }
        report.bulk.merge(result);
        done += chunk.len();
        on_chunk(done, records.len());
    }

    tracing::info!(
        "Indexed {} documents into '{}' ({} failed)",
        report.bulk.indexed,
        index.name(),
        report.bulk.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::InMemoryIndex;
    use crate::loader::{load_table, LoadOptions};
    use crate::store::memory::InMemoryStore;
    use crate::table::Table;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    async fn loaded_store(n: usize) -> InMemoryStore {
        let table = Table::from_raw_rows(
            vec![
                "Text".into(),
                "Language".into(),
                "Sentiment_Ensemble_Label".into(),
                "Sentiment_Ensemble_Score".into(),
            ],
            (0..n)
                .map(|i| {
                    vec![
                        format!("post number {}", i),
                        "en".into(),
                        "negative".into(),
                        "-0.5".into(),
                    ]
                })
                .collect(),
        )
        .unwrap();
        let store = InMemoryStore::new();
        load_table(&store, &table, &LoadOptions::default())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn publish_creates_index_and_writes_all() {
        let store = loaded_store(7).await;
        let index = InMemoryIndex::new("posts");
        let options = PublishOptions {
            chunk_size: 3,
            ..PublishOptions::default()
        };
        let mut chunks = Vec::new();
        let report = publish(
            &store,
            &index,
            &options,
            &mut StdRng::seed_from_u64(1),
            &mut |done, total| chunks.push((done, total)),
        )
        .await
        .unwrap();

        assert!(report.index_created);
        assert_eq!(report.read, 7);
        assert_eq!(report.bulk.indexed, 7);
        assert!(report.bulk.failures.is_empty());
        assert_eq!(chunks, vec![(3, 7), (6, 7), (7, 7)]);
        assert_eq!(index.count().await.unwrap(), 7);
        assert!(index.mapping().is_some());

        let first = store.find_all().await.unwrap().remove(0);
        let record = index.get(&first.id).unwrap();
        assert_eq!(record.body, "post number 0");
        assert_eq!(record.sentiment, "negative");
        assert_eq!(record.score, -0.5);
        assert_eq!(record.title, "Generic title");
    }

    #[tokio::test]
    async fn republish_does_not_grow_index() {
        let store = loaded_store(4).await;
        let index = InMemoryIndex::new("posts");
        let options = PublishOptions::default();
        let mut rng = StdRng::seed_from_u64(2);
        publish(&store, &index, &options, &mut rng, &mut |_, _| {})
            .await
            .unwrap();
        let second = publish(&store, &index, &options, &mut rng, &mut |_, _| {})
            .await
            .unwrap();
        assert!(!second.index_created);
        assert_eq!(index.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn rejected_records_are_reported() {
        let store = loaded_store(3).await;
        let bad = store.find_all().await.unwrap()[1].id.clone();
        let index = InMemoryIndex::new("posts").rejecting(vec![bad.clone()]);
        let report = publish(
            &store,
            &index,
            &PublishOptions::default(),
            &mut StdRng::seed_from_u64(3),
            &mut |_, _| {},
        )
        .await
        .unwrap();
        assert_eq!(report.bulk.indexed, 2);
        assert_eq!(report.bulk.failures.len(), 1);
        assert_eq!(report.bulk.failures[0].id, bad);
    }

    #[tokio::test]
    async fn zero_chunk_size_is_rejected() {
        let store = InMemoryStore::new();
        let index = InMemoryIndex::new("posts");
        let options = PublishOptions {
            chunk_size: 0,
            ..PublishOptions::default()
        };
        let result = publish(
            &store,
            &index,
            &options,
            &mut StdRng::seed_from_u64(4),
            &mut |_, _| {},
        )
        .await;
        assert!(result.is_err());
    }
}
