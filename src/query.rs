//! Reconstructs rows from daily files.
//!
//! A query lists the severity's `*.log` files, keeps those whose file date
//! matches, parses each into record blocks and returns the combined rows
//! newest first. Problems confined to one file or one block become
//! [`QueryWarning`]s on the result instead of failing the whole query.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{LogError, QueryWarning};
use crate::layout::LogLayout;
use crate::record::RecordReader;
use crate::row::{Row, RowTable};
use crate::severity::Severity;

/// Read-only access to a log root, usable without a running logger.
///
/// Takes no lock: prefer [`FileLogger::query_by_date`](crate::FileLogger::query_by_date)
/// when a logger in this process may be writing to the same root.
///
/// # Examples
///
/// ```
/// # use daily_logger::{LogQuery, Severity};
/// # use chrono::NaiveDate;
/// let query = LogQuery::new("/nonexistent/log/root");
/// let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let table = query.by_date(Severity::Info, date).unwrap();
/// assert!(table.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct LogQuery {
    layout: LogLayout,
}

impl LogQuery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: LogLayout::new(root),
        }
    }

    pub fn by_date(&self, severity: Severity, date: NaiveDate) -> Result<RowTable, LogError> {
        query_by_date(&self.layout, severity, date)
    }

    pub fn by_date_range(&self, severity: Severity, first: NaiveDate, second: NaiveDate) -> Result<RowTable, LogError> {
        query_by_date_range(&self.layout, severity, first, second)
    }
}

pub(crate) fn query_by_date(layout: &LogLayout, severity: Severity, date: NaiveDate) -> Result<RowTable, LogError> {
    collect(layout, severity, |file_date| file_date == date)
}

/// Inclusive on both ends; the bounds may be given in either order.
pub(crate) fn query_by_date_range(
    layout: &LogLayout,
    severity: Severity,
    first: NaiveDate,
    second: NaiveDate,
) -> Result<RowTable, LogError> {
    let (start, end) = if first <= second {
        (first, second)
    } else {
        (second, first)
    };
    collect(layout, severity, |file_date| start <= file_date && file_date <= end)
}

fn collect(layout: &LogLayout, severity: Severity, selected: impl Fn(NaiveDate) -> bool) -> Result<RowTable, LogError> {
    let (files, mut warnings) = layout.list_files(severity)?;

    let mut rows = Vec::new();
    for (_, path) in files.into_iter().filter(|(date, _)| selected(*date)) {
        read_file(&path, &mut rows, &mut warnings);
    }

    for warning in &warnings {
        tracing::warn!(severity = %severity, "{}", warning);
    }
    Ok(RowTable::from_parts(rows, warnings))
}

fn read_file(path: &Path, rows: &mut Vec<Row>, warnings: &mut Vec<QueryWarning>) {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warnings.push(QueryWarning::UnreadableFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            return;
        }
    };
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warnings.push(QueryWarning::UnreadableFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            return;
        }
    };

    let mut reader = RecordReader::new(&text);
    while let Some(result) = reader.read_record() {
        match result {
            Ok(row) => rows.push(row),
            Err(block) => warnings.push(QueryWarning::MalformedRecord {
                path: path.to_path_buf(),
                line: block.line,
                error: block.error,
            }),
        }
    }
    let trailing = reader.trailing_lines();
    if trailing > 0 {
        warnings.push(QueryWarning::TruncatedTail {
            path: path.to_path_buf(),
            lines: trailing,
        });
    }
}
