//! Error types for dataset handling and model failures.
//!
//! Schema errors are fatal at stage start. Detection errors never leave the
//! tagger: they are logged and mapped to the default language.

use thiserror::Error;

/// Errors raised while reading or extending a [`Table`](crate::table::Table).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A stage asked for a column the dataset does not have.
    #[error("column '{0}' not found in dataset")]
    MissingColumn(String),

    /// A stage tried to append a column that already exists.
    #[error("column '{0}' already exists; stages only append new columns")]
    DuplicateColumn(String),

    /// A new column does not have one cell per row.
    #[error("column '{name}' has {actual} values but the dataset has {expected} rows")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A row has a different number of cells than the header.
    #[error("row {row} has {actual} cells but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Failure reported by a language-identification model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// The text had no usable features (digits, punctuation, symbols only).
    #[error("no features in text")]
    NoFeatures,

    /// The model panicked or otherwise refused the input.
    #[error("language model failed: {0}")]
    Model(String),
}
