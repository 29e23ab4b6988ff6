//! TOML configuration.
//!
//! Layers, lowest first: built-in defaults, the config file, `HARC_*`
//! environment variables, then command-line flags (applied by the command
//! modules). The default file `./config/harc.toml` is optional; a path
//! given with `--config` must exist.

use anyhow::{bail, Context, Result};
use harcelement_core::index::Placeholders;
use harcelement_core::normalize::{NormalizeOptions, StopwordLanguage};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "./config/harc.toml";

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PreprocessConfig {
    #[serde(default = "default_preprocess_language")]
    pub language: String,
    #[serde(default)]
    pub expand_contractions: bool,
    #[serde(default)]
    pub handle_emojis: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            language: default_preprocess_language(),
            expand_contractions: false,
            handle_emojis: false,
        }
    }
}

fn default_preprocess_language() -> String {
    "english".to_string()
}

impl PreprocessConfig {
    pub fn options(&self) -> Result<NormalizeOptions> {
        let language = StopwordLanguage::from_name(&self.language).with_context(|| {
            format!(
                "Unknown preprocess language: '{}'. Must be english or french.",
                self.language
            )
        })?;
        Ok(NormalizeOptions {
            language,
            expand_contractions: self.expand_contractions,
            handle_emojis: self.handle_emojis,
        })
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LanguageConfig {
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default)]
    pub advanced: bool,
    #[serde(default = "default_true")]
    pub enable_fallback: bool,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            min_text_length: default_min_text_length(),
            default_language: default_language(),
            advanced: false,
            enable_fallback: true,
        }
    }
}

fn default_min_text_length() -> usize {
    10
}
fn default_language() -> String {
    "unknown".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SentimentConfig {
    #[serde(default)]
    pub advanced: bool,
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f64,
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            advanced: false,
            positive_threshold: default_positive_threshold(),
            negative_threshold: default_negative_threshold(),
        }
    }
}

fn default_positive_threshold() -> f64 {
    0.1
}
fn default_negative_threshold() -> f64 {
    -0.1
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_mongo_uri")]
    pub uri: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_mongo_uri(),
            database: default_database(),
            collection: default_collection(),
            id_field: default_id_field(),
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_mongo_uri() -> String {
    "mongodb://localhost:27017/".to_string()
}
fn default_database() -> String {
    "harcelement".to_string()
}
fn default_collection() -> String {
    "posts".to_string()
}
fn default_id_field() -> String {
    "Id_Post".to_string()
}
fn default_store_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IndexConfig {
    #[serde(default = "default_es_url")]
    pub url: String,
    #[serde(default = "default_index_name")]
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub verify_certs: bool,
    #[serde(default = "default_bulk_chunk_size")]
    pub bulk_chunk_size: usize,
    #[serde(default = "default_index_timeout_secs")]
    pub timeout_secs: u64,
    /// Stored field holding a real post timestamp. Empty disables it.
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,
    #[serde(default)]
    pub placeholders: Placeholders,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_es_url(),
            name: default_index_name(),
            username: None,
            password: None,
            verify_certs: true,
            bulk_chunk_size: default_bulk_chunk_size(),
            timeout_secs: default_index_timeout_secs(),
            timestamp_field: default_timestamp_field(),
            placeholders: Placeholders::default(),
        }
    }
}

fn default_es_url() -> String {
    "http://localhost:9200".to_string()
}
fn default_index_name() -> String {
    "harcelement_posts".to_string()
}
fn default_bulk_chunk_size() -> usize {
    500
}
fn default_index_timeout_secs() -> u64 {
    30
}
fn default_timestamp_field() -> String {
    "Date".to_string()
}

impl IndexConfig {
    pub fn timestamp_field(&self) -> Option<&str> {
        Some(self.timestamp_field.as_str()).filter(|f| !f.is_empty())
    }
}

/// Load the config file, layer environment overrides on top, and validate.
///
/// `path` is `None` when `--config` was not given; the default file is
/// then read if present.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                read_config(default)?
            } else {
                tracing::debug!("no config file at {}; using defaults", DEFAULT_CONFIG_PATH);
                Config::default()
            }
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content).with_context(|| "Failed to parse config file")
}

/// Overlay `HARC_*` variables. `lookup` returns a variable's value, if set.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("HARC_MONGO_URI") {
        config.store.uri = v;
    }
    if let Some(v) = lookup("HARC_ES_URL") {
        config.index.url = v;
    }
    if let Some(v) = lookup("HARC_ES_INDEX") {
        config.index.name = v;
    }
    if let Some(v) = lookup("HARC_ES_USER") {
        config.index.username = Some(v);
    }
    if let Some(v) = lookup("HARC_ES_PASSWORD") {
        config.index.password = Some(v);
    }
}

pub fn validate(config: &Config) -> Result<()> {
    config.preprocess.options()?;

    if config.language.min_text_length < 1 {
        bail!("language.min_text_length must be >= 1");
    }

    if config.sentiment.positive_threshold < config.sentiment.negative_threshold {
        bail!(
            "sentiment.positive_threshold ({}) must be >= sentiment.negative_threshold ({})",
            config.sentiment.positive_threshold,
            config.sentiment.negative_threshold
        );
    }

    if config.index.bulk_chunk_size < 1 {
        bail!("index.bulk_chunk_size must be >= 1");
    }

    if config.store.id_field.is_empty() {
        bail!("store.id_field must not be empty");
    }

    Ok(())
}
