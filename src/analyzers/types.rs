//! Data types produced by the reporting layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::features::RowIssue;
use crate::stats::{DelaySummary, Histogram};
use crate::table::ColumnKind;

/// One column as seen by the overview.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnOverview {
    pub(crate) name: String,
    pub(crate) kind: ColumnKind,
    pub(crate) missing: usize,
}

/// Shape, inferred kinds and missing-value counts of a table.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetOverview {
    pub(crate) rows: usize,
    pub(crate) columns: Vec<ColumnOverview>,
}

/// Delay statistics for a single pickup weekday.
#[derive(Debug, Clone, Serialize)]
pub struct WeekdaySummary {
    pub(crate) weekday: String,
    pub(crate) summary: DelaySummary,
}

/// Complete report for one run, written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct DelayReport {
    pub(crate) schema_version: u8,
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) overview: DatasetOverview,
    pub(crate) delay: Option<DelaySummary>,
    pub(crate) histogram: Histogram,
    pub(crate) mean_delay_by: BTreeMap<String, BTreeMap<String, f64>>,
    /// Ordered Monday first; days without delays are omitted.
    pub(crate) by_weekday: Vec<WeekdaySummary>,
    pub(crate) flagged_rows: Vec<RowIssue>,
}

impl DatasetOverview {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[ColumnOverview] {
        &self.columns
    }
}

impl ColumnOverview {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn missing(&self) -> usize {
        self.missing
    }
}

impl DelayReport {
    pub fn overview(&self) -> &DatasetOverview {
        &self.overview
    }

    pub fn delay(&self) -> Option<&DelaySummary> {
        self.delay.as_ref()
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn mean_delay_by(&self, column: &str) -> Option<&BTreeMap<String, f64>> {
        self.mean_delay_by.get(column)
    }

    pub fn weekdays(&self) -> impl Iterator<Item = (&str, &DelaySummary)> {
        self.by_weekday
            .iter()
            .map(|w| (w.weekday.as_str(), &w.summary))
    }

    pub fn flagged_rows(&self) -> &[RowIssue] {
        &self.flagged_rows
    }
}
