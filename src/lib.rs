//! # harcelement
//!
//! Batch enrichment and ingestion pipeline for a cyberbullying-detection
//! dataset. Raw posts are cleaned, normalized, tagged with language and
//! sentiment, loaded into MongoDB and published to Elasticsearch for
//! Kibana dashboards.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌────────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌───────────────┐
//! │ raw CSV │──▶│ clean      │──▶│ normalize│──▶│ language  │──▶│ sentiment│──▶│ enriched CSV  │
//! └─────────┘   └────────────┘   └──────────┘   └───────────┘   └──────────┘   └──────┬────────┘
//!                                                                                      │ load
//!                                                          ┌───────────────┐   ┌───────▼───────┐
//!                                                          │ Elasticsearch │◀──│    MongoDB    │
//!                                                          └───────────────┘   └───────────────┘
//!                                                                    publish
//! ```
//!
//! Every stage boundary is a CSV file; stages run one after another.
//!
//! ## Quick Start
//!
//! ```bash
//! harc clean --input raw.csv --output clean.csv --label-column cyberbullying_type
//! harc enrich --input clean.csv --output enriched.csv --advanced
//! harc load --input enriched.csv
//! harc publish
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`dataset`] | CSV stage handoff files |
//! | [`enrich_cmd`] | Dataset stage commands |
//! | [`stats`] | Dataset summaries |
//! | [`mongo`] | MongoDB document store |
//! | [`elastic`] | Elasticsearch search index |
//! | [`load_cmd`] | Store loading command |
//! | [`publish_cmd`] | Index publishing command |
//! | [`progress`] | Stage progress on stderr |
//!
//! The stage logic itself lives in [`harcelement_core`].

pub mod config;
pub mod dataset;
pub mod elastic;
pub mod enrich_cmd;
pub mod load_cmd;
pub mod mongo;
pub mod progress;
pub mod publish_cmd;
pub mod stats;
