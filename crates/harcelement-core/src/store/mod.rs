//! Document store abstraction.
//!
//! The [`DocumentStore`] trait covers the five operations the loader and
//! publisher need. The MongoDB implementation lives in the `harcelement`
//! binary crate; [`memory::InMemoryStore`] backs the tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One row as a field map.
pub type Record = Map<String, Value>;

/// A record read back from the store with its generated id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Store-generated id, rendered as a string.
    pub id: String,
    pub fields: Record,
}

impl StoredDocument {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field as text. Numbers and booleans are rendered; null and empty
    /// strings count as absent.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Field as a float. Numeric strings are parsed.
    pub fn number(&self, field: &str) -> Option<f64> {
        let value = match self.fields.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|f| f.is_finite())
    }
}

/// Abstract document store.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_many`](DocumentStore::insert_many) | Insert records in one bulk call |
/// | [`mirror_ids`](DocumentStore::mirror_ids) | Copy each document's id into a field |
/// | [`find_all`](DocumentStore::find_all) | Read every document |
/// | [`count`](DocumentStore::count) | Number of documents |
/// | [`clear`](DocumentStore::clear) | Delete every document |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert all records. Returns the generated ids in input order.
    async fn insert_many(&self, records: Vec<Record>) -> Result<Vec<String>>;

    /// Set `field` to the document's own id on every document in `ids`.
    ///
    /// Returns the number of documents modified.
    async fn mirror_ids(&self, ids: &[String], field: &str) -> Result<u64>;

    async fn find_all(&self) -> Result<Vec<StoredDocument>>;

    async fn count(&self) -> Result<u64>;

    /// Delete every document. Returns how many were removed.
    async fn clear(&self) -> Result<u64>;
}
