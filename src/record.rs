//! The on-disk record block: writer and reader.
//!
//! Every entry becomes ten lines, nine labelled fields and a separator:
//!
//! ```text
//! [Level]:Info
//! [OccurredAt]:2024-01-01 08:00:00.1234
//! [RecordedAt]:2024-01-01 08:00:00.1240
//! [User]:alice
//! [Permission]:1
//! [ClassName]:app::boot
//! [Method]:start
//! [Line]:42
//! [Message]:boot
//! ------------------------------------------------------------------------------------------
//! ```
//!
//! A field's value is everything after the first `]:` on its line.

use std::io::{self, Write};

use chrono::{NaiveDateTime, Timelike};

use crate::entry::LogEntry;
use crate::error::FormatError;
use crate::row::{Row, COLUMNS};

/// Line that terminates every record block.
pub const SEPARATOR: &str =
    "------------------------------------------------------------------------------------------";

/// Field lines plus the separator.
pub const LINES_PER_RECORD: usize = COLUMNS.len() + 1;

const DELIMITER: &str = "]:";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
/// Nanoseconds per unit of the four fractional digits written to disk.
const FRACTION_UNIT_NANOS: u32 = 100_000;

/// Renders a timestamp as `yyyy-MM-dd HH:mm:ss.ffff`, truncating to 100µs.
pub fn format_timestamp(at: &NaiveDateTime) -> String {
    let fraction = (at.nanosecond() % 1_000_000_000) / FRACTION_UNIT_NANOS;
    format!("{}.{:04}", at.format(TIMESTAMP_FORMAT), fraction)
}

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, FormatError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_PARSE_FORMAT)
        .map_err(|_| FormatError::BadTimestamp(text.to_string()))
}

/// Drops precision the record format cannot carry, so that an in-memory
/// timestamp compares equal to the one read back from disk.
pub fn truncate_timestamp(at: NaiveDateTime) -> NaiveDateTime {
    let nanos = at.nanosecond() % 1_000_000_000;
    at.with_nanosecond(nanos / FRACTION_UNIT_NANOS * FRACTION_UNIT_NANOS)
        .unwrap_or(at)
}

/// Builds the full ten-line block for one entry.
///
/// Line breaks inside any text field are replaced by spaces so the block
/// always has exactly [`LINES_PER_RECORD`] lines.
pub fn render_record(entry: &LogEntry, recorded_at: &NaiveDateTime) -> String {
    let mut out = String::with_capacity(256 + entry.message.len());
    let (class_name, method, line) = match &entry.call_site {
        Some(site) => (
            site.class_name.as_str(),
            site.method.as_str(),
            site.line.map(|l| l.to_string()).unwrap_or_default(),
        ),
        None => ("", "", String::new()),
    };

    push_field(&mut out, COLUMNS[0], entry.severity.as_str());
    push_field(&mut out, COLUMNS[1], &format_timestamp(&entry.occurred_at));
    push_field(&mut out, COLUMNS[2], &format_timestamp(recorded_at));
    push_field(&mut out, COLUMNS[3], &entry.user);
    push_field(&mut out, COLUMNS[4], &entry.permission.to_string());
    push_field(&mut out, COLUMNS[5], class_name);
    push_field(&mut out, COLUMNS[6], method);
    push_field(&mut out, COLUMNS[7], &line);
    push_field(&mut out, COLUMNS[8], &entry.message);
    out.push_str(SEPARATOR);
    out.push('\n');
    out
}

/// Appends one record with a single `write_all`.
pub fn write_record<W: Write>(writer: &mut W, entry: &LogEntry, recorded_at: &NaiveDateTime) -> io::Result<()> {
    writer.write_all(render_record(entry, recorded_at).as_bytes())
}

fn push_field(out: &mut String, label: &str, value: &str) {
    out.push('[');
    out.push_str(label);
    out.push_str(DELIMITER);
    for c in value.chars() {
        out.push(if c == '\n' || c == '\r' { ' ' } else { c });
    }
    out.push('\n');
}

/// Parses exactly one record block.
pub fn parse_record(lines: &[&str]) -> Result<Row, FormatError> {
    if lines.len() != LINES_PER_RECORD || lines[COLUMNS.len()].trim_end() != SEPARATOR {
        return Err(FormatError::MissingSeparator);
    }

    let mut values = [""; 9];
    for (index, value) in values.iter_mut().enumerate() {
        *value = field_value(lines[index], index)?;
    }

    let level = values[0]
        .parse()
        .map_err(|_| FormatError::BadSeverity(values[0].to_string()))?;
    let permission = values[4]
        .trim()
        .parse()
        .map_err(|_| FormatError::BadInteger(values[4].to_string()))?;
    let line = match values[7].trim() {
        "" => None,
        text => Some(
            text.parse()
                .map_err(|_| FormatError::BadInteger(text.to_string()))?,
        ),
    };

    Ok(Row {
        level,
        occurred_at: parse_timestamp(values[1])?,
        recorded_at: parse_timestamp(values[2])?,
        user: values[3].to_string(),
        permission,
        class_name: values[5].to_string(),
        method: values[6].to_string(),
        line,
        message: values[8].to_string(),
    })
}

fn field_value(line: &str, index: usize) -> Result<&str, FormatError> {
    let (label, value) = line
        .split_once(DELIMITER)
        .ok_or(FormatError::MissingDelimiter { index })?;
    let expected = COLUMNS[index];
    if label.strip_prefix('[') != Some(expected) {
        return Err(FormatError::WrongLabel { expected, index });
    }
    Ok(value)
}

/// A block that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedBlock {
    /// 1-based line number where the block started
    pub line: usize,
    pub error: FormatError,
}

/// Sequential reader over the text of one daily file.
///
/// Well-formed files are cut into consecutive ten-line blocks. When a block
/// does not parse, the reader reports it and resumes at the next line that
/// starts a record, so one torn write does not hide the records after it.
///
/// # Examples
///
/// ```
/// # use daily_logger::record::RecordReader;
/// let mut reader = RecordReader::new("");
/// assert!(reader.read_record().is_none());
/// assert_eq!(reader.trailing_lines(), 0);
/// ```
pub struct RecordReader<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    /// Reads the next block.
    ///
    /// Returns `None` once fewer than [`LINES_PER_RECORD`] lines remain;
    /// [`trailing_lines`](Self::trailing_lines) then tells how many were left
    /// over.
    pub fn read_record(&mut self) -> Option<Result<Row, MalformedBlock>> {
        if self.lines.len() - self.pos < LINES_PER_RECORD {
            return None;
        }

        let start = self.pos;
        let block = &self.lines[start..start + LINES_PER_RECORD];
        match parse_record(block) {
            Ok(row) => {
                self.pos += LINES_PER_RECORD;
                Some(Ok(row))
            }
            Err(error) => {
                self.pos = self.next_record_start(start + 1);
                Some(Err(MalformedBlock {
                    line: start + 1,
                    error,
                }))
            }
        }
    }

    /// Lines left unread because they do not form a whole block.
    pub fn trailing_lines(&self) -> usize {
        self.lines.len() - self.pos
    }

    fn next_record_start(&self, from: usize) -> usize {
        let level_prefix = format!("[{}{}", COLUMNS[0], DELIMITER);
        self.lines[from..]
            .iter()
            .position(|line| line.starts_with(&level_prefix))
            .map(|offset| from + offset)
            .unwrap_or(self.lines.len())
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = Result<Row, MalformedBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record()
    }
}
