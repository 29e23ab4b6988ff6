//! Column-oriented dataset passed between pipeline stages.
//!
//! A [`Table`] is what each stage reads from and writes to its CSV handoff
//! file. Stages never edit existing columns: they clone the input and
//! [`append_column`](Table::append_column) their results, so the output
//! always has the input's rows, in order, plus strictly more columns.
//!
//! Cell types are inferred per column the way pandas does when reading a
//! CSV: a column of integers is [`Cell::Int`], a column mixing integers and
//! decimals is [`Cell::Float`], anything else is [`Cell::Text`]. Empty cells
//! and the usual NA spellings become [`Cell::Null`].

use serde_json::{Map, Number, Value};

use crate::error::SchemaError;

/// Strings read as missing values.
const NA_VALUES: &[&str] = &[
    "", "NaN", "nan", "NA", "N/A", "n/a", "NULL", "null", "None", "<NA>", "#N/A",
];

/// A single dataset value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Render the cell for CSV output. Null renders as an empty field.
    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if f.is_finite() => format!("{:?}", f),
            Cell::Float(_) => String::new(),
            Cell::Text(s) => s.clone(),
        }
    }

    /// Convert to a JSON value for the document store.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Int(i) => Value::Number((*i).into()),
            Cell::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Cell::Float(f)
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Inferred {
    Bool,
    Int,
    Float,
    Text,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Build a column from raw CSV strings, inferring one type for the
    /// whole column.
    pub fn from_raw(name: impl Into<String>, raw: &[String]) -> Self {
        let mut kind: Option<Inferred> = None;
        for value in raw.iter().filter(|v| !is_na(v)) {
            let this = if parse_bool(value).is_some() {
                Inferred::Bool
            } else if value.parse::<i64>().is_ok() {
                Inferred::Int
            } else if value.parse::<f64>().is_ok() {
                Inferred::Float
            } else {
                Inferred::Text
            };
            kind = Some(match (kind, this) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(Inferred::Int), Inferred::Float) | (Some(Inferred::Float), Inferred::Int) => {
                    Inferred::Float
                }
                _ => Inferred::Text,
            });
            if kind == Some(Inferred::Text) {
                break;
            }
        }

        let kind = kind.unwrap_or(Inferred::Text);
        let cells = raw
            .iter()
            .map(|value| {
                if is_na(value) {
                    return Cell::Null;
                }
                match kind {
                    Inferred::Bool => parse_bool(value).map(Cell::Bool).unwrap_or(Cell::Null),
                    Inferred::Int => value.parse().map(Cell::Int).unwrap_or(Cell::Null),
                    Inferred::Float => value.parse().map(Cell::Float).unwrap_or(Cell::Null),
                    Inferred::Text => Cell::Text(value.clone()),
                }
            })
            .collect();

        Self::new(name, cells)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn is_na(value: &str) -> bool {
    NA_VALUES.contains(&value)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Column-oriented dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a header and raw string rows.
    pub fn from_raw_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, SchemaError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(SchemaError::RaggedRow {
                    row: i,
                    expected: headers.len(),
                    actual: row.len(),
                });
            }
        }

        let mut table = Table {
            columns: Vec::with_capacity(headers.len()),
            rows: rows.len(),
        };
        for (idx, name) in headers.into_iter().enumerate() {
            if table.has_column(&name) {
                return Err(SchemaError::DuplicateColumn(name));
            }
            let raw: Vec<String> = rows.iter().map(|r| r[idx].clone()).collect();
            table.columns.push(Column::from_raw(name, &raw));
        }
        Ok(table)
    }

    /// Build a table from already-typed columns.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, SchemaError> {
        let mut table = Table::new();
        for (i, column) in columns.into_iter().enumerate() {
            if i == 0 {
                table.rows = column.len();
            }
            table.append_column(column)?;
        }
        Ok(table)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`column`](Self::column), but a missing column is a schema error.
    pub fn require_column(&self, name: &str) -> Result<&Column, SchemaError> {
        self.column(name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
    }

    /// Fail unless none of `names` exists yet.
    pub fn ensure_absent(&self, names: &[&str]) -> Result<(), SchemaError> {
        match names.iter().find(|n| self.has_column(n)) {
            Some(n) => Err(SchemaError::DuplicateColumn(n.to_string())),
            None => Ok(()),
        }
    }

    /// Append a new column at the end. Existing columns are untouched.
    pub fn append_column(&mut self, column: Column) -> Result<(), SchemaError> {
        if self.has_column(&column.name) {
            return Err(SchemaError::DuplicateColumn(column.name));
        }
        if self.columns.is_empty() && self.rows == 0 {
            self.rows = column.len();
        }
        let actual = column.len();
        if actual != self.rows {
            return Err(SchemaError::LengthMismatch {
                name: column.name,
                expected: self.rows,
                actual,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Cell at (`column`, `row`), `None` when either is out of range.
    pub fn cell(&self, column: &str, row: usize) -> Option<&Cell> {
        self.column(column).and_then(|c| c.cells.get(row))
    }

    /// Cells of one row, in column order.
    pub fn row(&self, row: usize) -> Vec<&Cell> {
        self.columns.iter().map(|c| &c.cells[row]).collect()
    }

    /// Keep only the rows for which `keep` returns true, preserving order.
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Table {
        let indices: Vec<usize> = (0..self.rows).filter(|&i| keep(i)).collect();
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    cells: indices.iter().map(|&i| c.cells[i].clone()).collect(),
                })
                .collect(),
            rows: indices.len(),
        }
    }

    /// One JSON object per row, keyed by column name.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        (0..self.rows)
            .map(|i| {
                self.columns
                    .iter()
                    .map(|c| (c.name.clone(), c.cells[i].to_json()))
                    .collect()
            })
            .collect()
    }
}
