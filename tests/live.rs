//! Tests against real MongoDB and Elasticsearch servers.
//!
//! Skipped unless `HARC_LIVE_TESTS=1`. Servers are taken from
//! `HARC_MONGO_URI` / `HARC_ES_URL` (defaults: localhost). Each test works in
//! its own collection and index.

use harcelement::config::{Config, IndexConfig, StoreConfig};
use harcelement::elastic::ElasticIndex;
use harcelement::mongo::MongoStore;
use harcelement_core::index::SearchIndex;
use harcelement_core::loader::{load_table, LoadOptions};
use harcelement_core::publisher::{publish, PublishOptions};
use harcelement_core::store::DocumentStore;
use harcelement_core::table::Table;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn live() -> bool {
    std::env::var("HARC_LIVE_TESTS").map(|v| v == "1").unwrap_or(false)
}

fn suffix() -> String {
    format!("{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

fn live_config() -> Config {
    let mut config = Config::default();
    harcelement::config::apply_env_overrides(&mut config, |k| std::env::var(k).ok());
    let tag = suffix();
    config.store = StoreConfig {
        collection: format!("posts_test_{}", tag),
        ..config.store
    };
    config.index = IndexConfig {
        name: format!("harcelement_posts_test_{}", tag),
        bulk_chunk_size: 2,
        ..config.index
    };
    config
}

fn table(rows: usize) -> Table {
    let headers = vec!["Text".to_string(), "Language".to_string()];
    let rows = (0..rows)
        .map(|i| vec![format!("post number {}", i), "en".to_string()])
        .collect();
    Table::from_raw_rows(headers, rows).unwrap()
}

async fn drop_index(config: &IndexConfig) {
    let url = format!("{}/{}", config.url.trim_end_matches('/'), config.name);
    let mut req = reqwest::Client::new().delete(url);
    if let (Some(user), Some(password)) = (&config.username, &config.password) {
        req = req.basic_auth(user, Some(password));
    }
    let _ = req.send().await;
}

#[tokio::test]
async fn load_mirrors_every_id() {
    if !live() {
        return;
    }
    let config = live_config();
    let store = MongoStore::connect(&config.store).await.unwrap();

    let options = LoadOptions {
        id_field: "Id_Post".into(),
        replace: false,
    };
    let report = load_table(&store, &table(5), &options).await.unwrap();
    assert_eq!(report.inserted, 5);
    assert_eq!(report.mirrored, 5);

    let docs = store.find_all().await.unwrap();
    assert_eq!(docs.len(), 5);
    for doc in &docs {
        assert_eq!(doc.text("Id_Post").as_deref(), Some(doc.id.as_str()));
    }

    assert_eq!(store.clear().await.unwrap(), 5);
}

#[tokio::test]
async fn republish_does_not_grow_index() {
    if !live() {
        return;
    }
    let config = live_config();
    let store = MongoStore::connect(&config.store).await.unwrap();
    let index = ElasticIndex::new(&config.index).unwrap();

    let options = LoadOptions {
        id_field: config.store.id_field.clone(),
        replace: true,
    };
    load_table(&store, &table(5), &options).await.unwrap();

    let publish_options = PublishOptions {
        placeholders: config.index.placeholders.clone(),
        timestamp_field: None,
        chunk_size: config.index.bulk_chunk_size,
    };
    let mut rng = StdRng::seed_from_u64(3);

    let first = publish(&store, &index, &publish_options, &mut rng, &mut |_, _| {})
        .await
        .unwrap();
    assert!(first.index_created);
    assert_eq!(first.bulk.indexed, 5);
    index.refresh().await.unwrap();
    assert_eq!(index.count().await.unwrap(), 5);

    let second = publish(&store, &index, &publish_options, &mut rng, &mut |_, _| {})
        .await
        .unwrap();
    assert!(!second.index_created);
    index.refresh().await.unwrap();
    assert_eq!(index.count().await.unwrap(), 5);

    store.clear().await.unwrap();
    drop_index(&config.index).await;
}
