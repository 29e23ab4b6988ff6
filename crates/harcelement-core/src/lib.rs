//! # harcelement core
//!
//! Dataset enrichment logic for the `harc` pipeline, free of file and
//! network I/O:
//!
//! | Module | Stage |
//! |--------|-------|
//! | [`clean`] | label and category canonicalization |
//! | [`normalize`] | text normalization |
//! | [`language`] | language tagging |
//! | [`sentiment`] | VADER, pattern-lexicon and ensemble scoring |
//! | [`enrich`] | row-wise application over a [`Table`](table::Table) |
//! | [`loader`] | bulk load into a [`DocumentStore`](store::DocumentStore) |
//! | [`publisher`] | projection into a [`SearchIndex`](index::SearchIndex) |
//!
//! MongoDB and Elasticsearch implementations of the store and index traits
//! live in the `harcelement` crate; the in-memory ones here back the tests.

pub mod clean;
pub mod enrich;
pub mod error;
pub mod index;
pub mod language;
pub mod loader;
pub mod normalize;
pub mod publisher;
pub mod sentiment;
pub mod store;
pub mod table;
