//! In-memory [`SearchIndex`] for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{BulkFailure, BulkReport, IndexRecord, SearchIndex};

pub struct InMemoryIndex {
    name: String,
    mapping: RwLock<Option<Value>>,
    docs: RwLock<BTreeMap<String, IndexRecord>>,
    rejected: BTreeSet<String>,
}

impl InMemoryIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mapping: RwLock::new(None),
            docs: RwLock::new(BTreeMap::new()),
            rejected: BTreeSet::new(),
        }
    }

    /// Refuse writes for these ids, reporting them as failures.
    pub fn rejecting(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.rejected = ids.into_iter().collect();
        self
    }

    pub fn mapping(&self) -> Option<Value> {
        self.mapping.read().ok().and_then(|m| m.clone())
    }

    pub fn get(&self, id: &str) -> Option<IndexRecord> {
        self.docs.read().ok().and_then(|d| d.get(id).cloned())
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory index lock poisoned")
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.mapping.read().map_err(poisoned)?.is_some())
    }

    async fn create(&self, mapping: &Value) -> Result<()> {
        let mut current = self.mapping.write().map_err(poisoned)?;
        if current.is_none() {
            *current = Some(mapping.clone());
        }
        Ok(())
    }

    async fn bulk_index(&self, docs: &[(String, IndexRecord)]) -> Result<BulkReport> {
        {
            let mut mapping = self.mapping.write().map_err(poisoned)?;
            if mapping.is_none() {
                *mapping = Some(Value::Null);
            }
        }
        let mut stored = self.docs.write().map_err(poisoned)?;
        let mut report = BulkReport::default();
        for (id, record) in docs {
            if self.rejected.contains(id) {
                report.failures.push(BulkFailure {
                    id: id.clone(),
                    status: 400,
                    reason: "mapper_parsing_exception".to_string(),
                });
                continue;
            }
            stored.insert(id.clone(), record.clone());
            report.indexed += 1;
        }
        Ok(report)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.docs.read().map_err(poisoned)?.len() as u64)
    }
}
