//! MongoDB [`DocumentStore`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use harcelement_core::store::{DocumentStore, Record, StoredDocument};
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::StoreConfig;

pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connect and ping the server so an unreachable store fails here.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .with_context(|| format!("Invalid MongoDB URI: {}", config.uri))?;
        let timeout = Duration::from_secs(config.timeout_secs);
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);
        options.app_name = Some("harc".to_string());

        let client = Client::with_options(options).context("Failed to create MongoDB client")?;
        let db = client.database(&config.database);
        db.run_command(doc! { "ping": 1 }, None)
            .await
            .with_context(|| format!("Failed to connect to MongoDB at {}", config.uri))?;

        tracing::info!(
            "Connected to MongoDB {}.{}",
            config.database,
            config.collection
        );
        Ok(Self {
            collection: db.collection(&config.collection),
        })
    }
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn string_to_id(id: &str) -> Bson {
    ObjectId::parse_str(id)
        .map(Bson::ObjectId)
        .unwrap_or_else(|_| Bson::String(id.to_string()))
}

/// BSON to JSON with object ids as hex strings and dates as RFC 3339.
fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or(Value::Null),
        Bson::Document(doc) => Value::Object(
            doc.into_iter()
                .map(|(k, v)| (k, bson_to_json(v)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

fn to_stored(mut doc: Document) -> StoredDocument {
    let id = doc
        .remove("_id")
        .map(|id| id_to_string(&id))
        .unwrap_or_default();
    let fields: Map<String, Value> = doc.into_iter().map(|(k, v)| (k, bson_to_json(v))).collect();
    StoredDocument { id, fields }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_many(&self, records: Vec<Record>) -> Result<Vec<String>> {
        let n = records.len();
        let docs = records
            .iter()
            .map(bson::to_document)
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to convert rows to BSON")?;

        let result = self
            .collection
            .insert_many(docs, None)
            .await
            .context("MongoDB insert_many failed")?;

        (0..n)
            .map(|i| {
                result
                    .inserted_ids
                    .get(&i)
                    .map(id_to_string)
                    .with_context(|| format!("MongoDB returned no id for row {}", i))
            })
            .collect()
    }

    async fn mirror_ids(&self, ids: &[String], field: &str) -> Result<u64> {
        let ids: Vec<Bson> = ids.iter().map(|id| string_to_id(id)).collect();
        let mut set = Document::new();
        set.insert(field, "$_id");

        let result = self
            .collection
            .update_many(doc! { "_id": { "$in": ids } }, vec![doc! { "$set": set }], None)
            .await
            .context("MongoDB update_many failed")?;
        Ok(result.modified_count)
    }

    async fn find_all(&self) -> Result<Vec<StoredDocument>> {
        let mut cursor = self
            .collection
            .find(None, None)
            .await
            .context("MongoDB find failed")?;
        let mut out = Vec::new();
        while let Some(doc) = cursor.try_next().await.context("MongoDB cursor failed")? {
            out.push(to_stored(doc));
        }
        Ok(out)
    }

    async fn count(&self) -> Result<u64> {
        self.collection
            .count_documents(None, None)
            .await
            .context("MongoDB count failed")
    }

    async fn clear(&self) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! {}, None)
            .await
            .context("MongoDB delete_many failed")?;
        Ok(result.deleted_count)
    }
}
