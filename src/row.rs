use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::QueryWarning;
use crate::severity::Severity;

/// Column names of a [`RowTable`], in on-disk field order.
pub const COLUMNS: [&str; 9] = [
    "Level",
    "OccurredAt",
    "RecordedAt",
    "User",
    "Permission",
    "ClassName",
    "Method",
    "Line",
    "Message",
];

/// One record reconstructed from a daily log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub level: Severity,
    pub occurred_at: NaiveDateTime,
    pub recorded_at: NaiveDateTime,
    pub user: String,
    pub permission: i32,
    /// Empty when the entry had no call site
    pub class_name: String,
    pub method: String,
    pub line: Option<u32>,
    pub message: String,
}

/// Result of a query: rows ordered newest first, plus anything that had to be
/// skipped along the way.
#[derive(Debug, Clone, Default)]
pub struct RowTable {
    rows: Vec<Row>,
    warnings: Vec<QueryWarning>,
}

impl RowTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(mut rows: Vec<Row>, warnings: Vec<QueryWarning>) -> Self {
        // Stable sort: rows with equal occurrence times keep file order.
        rows.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Self { rows, warnings }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn warnings(&self) -> &[QueryWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl IntoIterator for RowTable {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RowTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
