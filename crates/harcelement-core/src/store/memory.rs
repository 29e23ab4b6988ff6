//! In-memory [`DocumentStore`] for tests.
//!
//! Ids are 24-digit hex counters, the same shape as MongoDB object ids.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{DocumentStore, Record, StoredDocument};

pub struct InMemoryStore {
    docs: RwLock<Vec<StoredDocument>>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_many(&self, records: Vec<Record>) -> Result<Vec<String>> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        let mut ids = Vec::with_capacity(records.len());
        for fields in records {
            let id = format!("{:024x}", self.next_id.fetch_add(1, Ordering::Relaxed));
            ids.push(id.clone());
            docs.push(StoredDocument { id, fields });
        }
        Ok(ids)
    }

    async fn mirror_ids(&self, ids: &[String], field: &str) -> Result<u64> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        let mut modified = 0;
        for doc in docs.iter_mut().filter(|d| ids.contains(&d.id)) {
            doc.fields
                .insert(field.to_string(), Value::String(doc.id.clone()));
            modified += 1;
        }
        Ok(modified)
    }

    async fn find_all(&self) -> Result<Vec<StoredDocument>> {
        Ok(self.docs.read().map_err(poisoned)?.clone())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.docs.read().map_err(poisoned)?.len() as u64)
    }

    async fn clear(&self) -> Result<u64> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        let removed = docs.len() as u64;
        docs.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(text: &str) -> Record {
        json!({ "Text": text, "Score": 0.5 })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn insert_mirror_find() {
        let store = InMemoryStore::new();
        let ids = store
            .insert_many(vec![record("a"), record("b")])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(ids[0].len(), 24);

        assert_eq!(store.mirror_ids(&ids, "Id_Post").await.unwrap(), 2);
        let docs = store.find_all().await.unwrap();
        for doc in &docs {
            assert_eq!(doc.text("Id_Post"), Some(doc.id.clone()));
        }
        assert_eq!(docs[0].text("Text").as_deref(), Some("a"));
        assert_eq!(docs[0].number("Score"), Some(0.5));
    }

    #[tokio::test]
    async fn clear_and_count() {
        let store = InMemoryStore::new();
        store.insert_many(vec![record("a")]).await.unwrap();
        store.insert_many(vec![record("a")]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
