//! Search index abstraction and the index record schema.
//!
//! Every stored document is projected into an [`IndexRecord`] with a fixed
//! set of fields. [`index_mapping`] gives the matching mapping:
//!
//! | Field | Type |
//! |-------|------|
//! | `title`, `body`, `author` | text |
//! | `url`, `language`, `sentiment` | keyword |
//! | `date` | date |
//! | `score` | float |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::StoredDocument;

/// Days back a generated date may fall.
pub const RANDOM_DATE_WINDOW_DAYS: i64 = 365;

const TEXT_FIELD: &str = "Text";
const LANGUAGE_FIELD: &str = "Language";
const SENTIMENT_FIELD: &str = "Sentiment_Ensemble_Label";
const SCORE_FIELD: &str = "Sentiment_Ensemble_Score";
const TITLE_FIELDS: &[&str] = &["Title", "title"];
const AUTHOR_FIELDS: &[&str] = &["Author", "author"];
const URL_FIELDS: &[&str] = &["URL", "Url", "url"];

/// One document as the search index sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub title: String,
    pub body: String,
    pub author: String,
    /// RFC 3339 timestamp.
    pub date: String,
    pub url: String,
    pub language: String,
    pub sentiment: String,
    pub score: f64,
}

/// Field mapping for a new index.
pub fn index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "title": { "type": "text" },
                "body": { "type": "text" },
                "author": { "type": "text" },
                "date": { "type": "date" },
                "url": { "type": "keyword" },
                "language": { "type": "keyword" },
                "sentiment": { "type": "keyword" },
                "score": { "type": "float" }
            }
        }
    })
}

/// Values used when a document has no title, author or url.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    pub title: String,
    pub author: String,
    pub url: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            title: "Generic title".to_string(),
            author: "anonymous".to_string(),
            url: "https://example.com/post".to_string(),
        }
    }
}

/// Uniformly random instant between `now` and 365 days before it, at
/// whole-day offsets.
pub fn random_recent_date<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> DateTime<Utc> {
    let days = rng.gen_range(0..=RANDOM_DATE_WINDOW_DAYS);
    now - Duration::days(days)
}

/// Parse a stored timestamp: RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`,
/// or integer seconds since the epoch.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(Utc.from_utc_datetime(&naive));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

fn first_text(doc: &StoredDocument, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|f| doc.text(f))
}

/// Project a stored document into an [`IndexRecord`].
///
/// `timestamp_field` is read when present and parseable; otherwise the
/// date is drawn with [`random_recent_date`].
pub fn build_index_record<R: Rng + ?Sized>(
    doc: &StoredDocument,
    placeholders: &Placeholders,
    timestamp_field: Option<&str>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> IndexRecord {
    let date = timestamp_field
        .and_then(|f| doc.get(f))
        .and_then(parse_timestamp)
        .unwrap_or_else(|| random_recent_date(rng, now));

    IndexRecord {
        title: first_text(doc, TITLE_FIELDS).unwrap_or_else(|| placeholders.title.clone()),
        body: doc.text(TEXT_FIELD).unwrap_or_default(),
        author: first_text(doc, AUTHOR_FIELDS).unwrap_or_else(|| placeholders.author.clone()),
        date: date.to_rfc3339_opts(SecondsFormat::Secs, true),
        url: first_text(doc, URL_FIELDS).unwrap_or_else(|| placeholders.url.clone()),
        language: doc
            .text(LANGUAGE_FIELD)
            .unwrap_or_else(|| "unknown".to_string()),
        sentiment: doc
            .text(SENTIMENT_FIELD)
            .unwrap_or_else(|| "neutral".to_string()),
        score: doc.number(SCORE_FIELD).unwrap_or(0.0),
    }
}

/// A record the index refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkFailure {
    pub id: String,
    pub status: u16,
    pub reason: String,
}

/// Outcome of one bulk write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkReport {
    pub indexed: usize,
    pub failures: Vec<BulkFailure>,
}

impl BulkReport {
    pub fn merge(&mut self, other: BulkReport) {
        self.indexed += other.indexed;
        self.failures.extend(other.failures);
    }
}

/// Abstract search index bound to one index name.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    fn name(&self) -> &str;

    async fn exists(&self) -> Result<bool>;

    /// Create the index with `mapping`. Creating an index that already
    /// exists is not an error.
    async fn create(&self, mapping: &Value) -> Result<()>;

    /// Write `(id, record)` pairs, overwriting documents with the same id.
    ///
    /// Per-record rejections are returned in the report; only transport
    /// failures are errors.
    async fn bulk_index(&self, docs: &[(String, IndexRecord)]) -> Result<BulkReport>;

    async fn count(&self) -> Result<u64>;
}

/// Create the index with [`index_mapping`] unless it exists.
///
/// Returns `true` when the index was created.
pub async fn ensure_index(index: &dyn SearchIndex) -> Result<bool> {
    if index.exists().await? {
        tracing::info!("Index '{}' already exists", index.name());
        return Ok(false);
    }
    index.create(&index_mapping()).await?;
    tracing::info!("Index '{}' created", index.name());
    Ok(true)
}
