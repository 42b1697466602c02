//! In-memory tabular representation shared by every pipeline stage.
//!
//! Cells are kept as the raw strings read from the source so passthrough
//! columns are written back byte-for-byte. Each column carries an inferred
//! [`ColumnKind`] used for reporting.

use chrono::NaiveDate;
use serde::Serialize;

/// Value type inferred from the non-empty cells of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Date,
    Text,
    /// Every cell is empty.
    Empty,
}

impl ColumnKind {
    /// Infers the narrowest kind that accepts every non-empty cell.
    pub fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut kind = ColumnKind::Empty;

        for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
            let cell_kind = classify_cell(cell);
            kind = widen(kind, cell_kind);
            if kind == ColumnKind::Text {
                break;
            }
        }

        kind
    }
}

fn classify_cell(cell: &str) -> ColumnKind {
    if cell.parse::<i64>().is_ok() {
        ColumnKind::Integer
    } else if cell.parse::<f64>().is_ok() {
        ColumnKind::Float
    } else if parse_bool(cell).is_some() {
        ColumnKind::Boolean
    } else if NaiveDate::parse_from_str(cell, DATE_FORMAT).is_ok() {
        ColumnKind::Date
    } else {
        ColumnKind::Text
    }
}

fn widen(current: ColumnKind, next: ColumnKind) -> ColumnKind {
    use ColumnKind::*;
    match (current, next) {
        (Empty, k) => k,
        (a, b) if a == b => a,
        (Integer, Float) | (Float, Integer) => Float,
        _ => Text,
    }
}

/// Date format used for every date cell the pipeline writes.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Parses an integer cell, accepting integral float spellings such as `3.0`.
///
/// Returns `Ok(None)` for an empty cell and `Err(())` for anything that is
/// not an integral number.
pub(crate) fn parse_integral(cell: &str) -> Result<Option<i64>, ()> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    if let Ok(v) = cell.parse::<i64>() {
        return Ok(Some(v));
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            Ok(Some(v as i64))
        }
        _ => Err(()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    kinds: Vec<ColumnKind>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table and infers a kind for every column.
    ///
    /// Rows must have exactly one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        let kinds = (0..columns.len())
            .map(|i| ColumnKind::infer(rows.iter().map(|r| r[i].as_str())))
            .collect();
        Table {
            columns,
            kinds,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Position of the first column with this exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterates the cells of one column, top to bottom.
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |r| r[index].as_str())
    }

    /// Rewrites column names in place. Values and kinds are untouched.
    pub fn rename_columns(mut self, mut rename: impl FnMut(&str) -> String) -> Self {
        for name in &mut self.columns {
            *name = rename(name);
        }
        self
    }

    /// Sets a column's values, overwriting an existing column of that name
    /// in place or appending a new one at the end. The column kind is
    /// re-inferred from `values`.
    ///
    /// `values` must hold one cell per row.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let kind = ColumnKind::infer(values.iter().map(String::as_str));
        match self.column_index(name) {
            Some(i) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[i] = value;
                }
                self.kinds[i] = kind;
            }
            None => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
                self.columns.push(name.to_string());
                self.kinds.push(kind);
            }
        }
    }

    /// Number of empty cells per column, in column order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let missing = self.column_cells(i).filter(|c| c.trim().is_empty()).count();
                (name.clone(), missing)
            })
            .collect()
    }
}
