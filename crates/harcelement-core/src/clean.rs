//! Label and category canonicalization.
//!
//! Raw datasets spell the bullying label many ways (`not_cyberbullying`,
//! `0`, `religion`, `other_cyberbullying`, ...). [`clean_table`] maps them
//! onto two appended columns:
//!
//! - `Label`: `Bullying` or `Not-Bullying` (null when unrecognized)
//! - `Types`: `Age`, `Ethnicity`, `Gender`, `Religion` or `Other`, and
//!   always null unless `Label` is `Bullying`

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::SchemaError;
use crate::table::{Cell, Column, Table};

pub const LABEL_COLUMN: &str = "Label";
pub const TYPES_COLUMN: &str = "Types";

/// Canonical bullying label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BullyingLabel {
    #[serde(rename = "Bullying")]
    Bullying,
    #[serde(rename = "Not-Bullying")]
    NotBullying,
}

impl BullyingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullying => "Bullying",
            Self::NotBullying => "Not-Bullying",
        }
    }
}

impl fmt::Display for BullyingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical bullying category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BullyingType {
    Age,
    Ethnicity,
    Gender,
    Religion,
    Other,
}

impl BullyingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Ethnicity => "Ethnicity",
            Self::Gender => "Gender",
            Self::Religion => "Religion",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for BullyingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const NOT_BULLYING: &[&str] = &[
    "not_bullying",
    "notbullying",
    "not_cyberbullying",
    "non_bullying",
    "no_bullying",
    "none",
    "no",
    "false",
    "0",
    "0.0",
];

const BULLYING: &[&str] = &["bullying", "cyberbullying", "yes", "true", "1", "1.0"];

const TYPES: &[(&str, BullyingType)] = &[
    ("age", BullyingType::Age),
    ("age_cyberbullying", BullyingType::Age),
    ("ethnicity", BullyingType::Ethnicity),
    ("ethnicity_cyberbullying", BullyingType::Ethnicity),
    ("race", BullyingType::Ethnicity),
    ("gender", BullyingType::Gender),
    ("gender_cyberbullying", BullyingType::Gender),
    ("religion", BullyingType::Religion),
    ("religion_cyberbullying", BullyingType::Religion),
    ("other", BullyingType::Other),
    ("other_cyberbullying", BullyingType::Other),
];

fn key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

/// Canonical category for a raw category spelling.
pub fn canonical_type(raw: &str) -> Option<BullyingType> {
    let k = key(raw);
    TYPES.iter().find(|(s, _)| *s == k).map(|(_, t)| *t)
}

/// Canonical label, plus the category when the raw label names one.
pub fn canonical_label(raw: &str) -> Option<(BullyingLabel, Option<BullyingType>)> {
    let k = key(raw);
    if NOT_BULLYING.contains(&k.as_str()) {
        return Some((BullyingLabel::NotBullying, None));
    }
    if BULLYING.contains(&k.as_str()) {
        return Some((BullyingLabel::Bullying, None));
    }
    canonical_type(&k).map(|t| (BullyingLabel::Bullying, Some(t)))
}

/// Canonicalize one raw (label, category) pair.
///
/// The category is dropped unless the label resolves to `Bullying`.
pub fn canonicalize(
    label: &str,
    category: Option<&str>,
) -> (Option<BullyingLabel>, Option<BullyingType>) {
    match canonical_label(label) {
        Some((BullyingLabel::Bullying, from_label)) => (
            Some(BullyingLabel::Bullying),
            from_label.or_else(|| category.and_then(canonical_type)),
        ),
        Some((BullyingLabel::NotBullying, _)) => (Some(BullyingLabel::NotBullying), None),
        None => {
            tracing::debug!("unrecognized label '{}'", label);
            (None, None)
        }
    }
}

/// Append canonical `Label` and `Types` columns derived from `label_column`
/// (and `type_column` when given).
pub fn clean_table(
    table: &Table,
    label_column: &str,
    type_column: Option<&str>,
) -> Result<Table, SchemaError> {
    let labels = table.require_column(label_column)?;
    let categories = type_column.map(|c| table.require_column(c)).transpose()?;
    table.ensure_absent(&[LABEL_COLUMN, TYPES_COLUMN])?;

    let mut label_cells = Vec::with_capacity(table.row_count());
    let mut type_cells = Vec::with_capacity(table.row_count());
    for (i, cell) in labels.cells.iter().enumerate() {
        let category = categories.map(|c| c.cells[i].render());
        let (label, kind) = if cell.is_null() {
            (None, None)
        } else {
            canonicalize(&cell.render(), category.as_deref())
        };
        label_cells.push(label.map(|l| Cell::from(l.as_str())).unwrap_or(Cell::Null));
        type_cells.push(kind.map(|t| Cell::from(t.as_str())).unwrap_or(Cell::Null));
    }

    let mut out = table.clone();
    out.append_column(Column::new(LABEL_COLUMN, label_cells))?;
    out.append_column(Column::new(TYPES_COLUMN, type_cells))?;
    tracing::info!("Cleaned labels for {} rows", out.row_count());
    Ok(out)
}

/// Label and category distribution of a cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelStats {
    pub total: usize,
    pub labels: BTreeMap<String, usize>,
    pub types: BTreeMap<String, usize>,
    pub unlabeled: usize,
    pub bullying_rate: f64,
}

/// Count labels and types. Requires the `Label` column; `Types` is optional.
pub fn label_stats(table: &Table) -> Result<LabelStats, SchemaError> {
    let labels = table.require_column(LABEL_COLUMN)?;
    let mut out = LabelStats {
        total: table.row_count(),
        labels: BTreeMap::new(),
        types: BTreeMap::new(),
        unlabeled: 0,
        bullying_rate: 0.0,
    };
    for cell in &labels.cells {
        match cell {
            Cell::Null => out.unlabeled += 1,
            other => *out.labels.entry(other.render()).or_default() += 1,
        }
    }
    if let Some(types) = table.column(TYPES_COLUMN) {
        for cell in types.cells.iter().filter(|c| !c.is_null()) {
            *out.types.entry(cell.render()).or_default() += 1;
        }
    }
    if out.total > 0 {
        let bullying = out
            .labels
            .get(BullyingLabel::Bullying.as_str())
            .copied()
            .unwrap_or(0);
        out.bullying_rate = bullying as f64 / out.total as f64 * 100.0;
    }
    Ok(out)
}
