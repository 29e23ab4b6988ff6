//! Elasticsearch [`SearchIndex`] over the REST API.
//!
//! Only the calls the publisher needs: `HEAD /{index}`, `PUT /{index}`,
//! `POST /_bulk`, `GET /{index}/_count` and `POST /{index}/_refresh`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use harcelement_core::index::{BulkFailure, BulkReport, IndexRecord, SearchIndex};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::config::IndexConfig;

pub struct ElasticIndex {
    client: reqwest::Client,
    base_url: String,
    name: String,
    auth: Option<(String, String)>,
}

impl ElasticIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_certs)
            .build()
            .context("Failed to build HTTP client")?;

        let auth = match (&config.username, &config.password) {
            (Some(user), Some(password)) if !user.is_empty() => {
                Some((user.clone(), password.clone()))
            }
            _ => None,
        };

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            name: config.name.clone(),
            auth,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, path));
        match &self.auth {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    /// Make recent writes visible to search and count.
    pub async fn refresh(&self) -> Result<()> {
        let resp = self
            .request(Method::POST, &format!("{}/_refresh", self.name))
            .send()
            .await
            .with_context(|| format!("Failed to reach Elasticsearch at {}", self.base_url))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Elasticsearch refresh error {}: {}", status, body);
        }
        Ok(())
    }
}

/// Newline-delimited bulk body: an `index` action line, then the source.
pub fn bulk_body(index: &str, docs: &[(String, IndexRecord)]) -> Result<String> {
    let mut body = String::new();
    for (id, record) in docs {
        let action = serde_json::json!({ "index": { "_index": index, "_id": id } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    Ok(body)
}

/// Collect per-item results from a bulk response.
pub fn parse_bulk_response(json: &Value) -> Result<BulkReport> {
    let items = json
        .get("items")
        .and_then(|i| i.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid bulk response: missing items array"))?;

    let mut report = BulkReport::default();
    for item in items {
        let Some(result) = item.as_object().and_then(|o| o.values().next()) else {
            continue;
        };
        let status = result.get("status").and_then(|s| s.as_u64()).unwrap_or(0) as u16;
        match result.get("error") {
            Some(error) if !error.is_null() => {
                let kind = error.get("type").and_then(|t| t.as_str()).unwrap_or("error");
                let reason = error.get("reason").and_then(|r| r.as_str()).unwrap_or("");
                report.failures.push(BulkFailure {
                    id: result
                        .get("_id")
                        .and_then(|i| i.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    status,
                    reason: format!("{}: {}", kind, reason),
                });
            }
            _ => report.indexed += 1,
        }
    }
    Ok(report)
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<bool> {
        let resp = self
            .request(Method::HEAD, &self.name)
            .send()
            .await
            .with_context(|| format!("Failed to reach Elasticsearch at {}", self.base_url))?;
        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => bail!("Elasticsearch error {} checking index '{}'", s, self.name),
        }
    }

    async fn create(&self, mapping: &Value) -> Result<()> {
        let resp = self
            .request(Method::PUT, &self.name)
            .json(mapping)
            .send()
            .await
            .with_context(|| format!("Failed to reach Elasticsearch at {}", self.base_url))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception") {
            return Ok(());
        }
        bail!("Elasticsearch error {} creating index: {}", status, body);
    }

    async fn bulk_index(&self, docs: &[(String, IndexRecord)]) -> Result<BulkReport> {
        if docs.is_empty() {
            return Ok(BulkReport::default());
        }
        let resp = self
            .request(Method::POST, "_bulk")
            .header("Content-Type", "application/x-ndjson")
            .body(bulk_body(&self.name, docs)?)
            .send()
            .await
            .with_context(|| format!("Failed to reach Elasticsearch at {}", self.base_url))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Elasticsearch bulk error {}: {}", status, body);
        }
        let json: Value = resp.json().await.context("Invalid bulk response")?;
        parse_bulk_response(&json)
    }

    async fn count(&self) -> Result<u64> {
        let resp = self
            .request(Method::GET, &format!("{}/_count", self.name))
            .send()
            .await
            .with_context(|| format!("Failed to reach Elasticsearch at {}", self.base_url))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Elasticsearch count error {}: {}", status, body);
        }
        let json: Value = resp.json().await.context("Invalid count response")?;
        json.get("count")
            .and_then(|c| c.as_u64())
            .ok_or_else(|| anyhow::anyhow!("Invalid count response: missing count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> IndexRecord {
        IndexRecord {
            title: "Generic title".into(),
            body: "hello".into(),
            author: "anonymous".into(),
            date: "2026-01-01T00:00:00Z".into(),
            url: "https://example.com/post".into(),
            language: "en".into(),
            sentiment: "neutral".into(),
            score: 0.0,
        }
    }

    #[test]
    fn bulk_body_is_ndjson() {
        let body = bulk_body("posts", &[("a1".into(), record()), ("b2".into(), record())]).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(body.ends_with('\n'));
        let action: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["index"]["_id"], "a1");
        assert_eq!(action["index"]["_index"], "posts");
        let source: IndexRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(source, record());
    }

    #[test]
    fn bulk_response_failures() {
        let resp = json!({
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "_id": "a1", "status": 201, "result": "created" } },
                { "index": { "_id": "b2", "status": 200, "result": "updated" } },
                { "index": { "_id": "c3", "status": 400, "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [date]"
                } } }
            ]
        });
        let report = parse_bulk_response(&resp).unwrap();
        assert_eq!(report.indexed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "c3");
        assert_eq!(report.failures[0].status, 400);
        assert!(report.failures[0].reason.starts_with("mapper_parsing_exception"));
    }

    #[test]
    fn bulk_response_without_items() {
        assert!(parse_bulk_response(&json!({ "error": "boom" })).is_err());
    }

    #[test]
    fn auth_requires_user_and_password() {
        let mut config = IndexConfig {
            username: Some("elastic".into()),
            ..IndexConfig::default()
        };
        assert!(ElasticIndex::new(&config).unwrap().auth.is_none());
        config.password = Some("secret".into());
        let index = ElasticIndex::new(&config).unwrap();
        assert_eq!(index.auth, Some(("elastic".into(), "secret".into())));
        assert_eq!(index.base_url, "http://localhost:9200");
    }
}
