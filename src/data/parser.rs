//! Tabular parser: raw comma-separated text into a validated [`Table`].
//!
//! The format is simpler than RFC 4180. Every line is split on
//! commas, and surrounding whitespace and double quotes are stripped from each
//! field; quoted fields containing embedded commas or quotes are not supported.
//! The reader is a `csv::Reader` with quoting disabled so that a `"` is an
//! ordinary character to be stripped afterwards rather than an escape.
//!
//! The first line is the header. Its first field labels the frequency column
//! (only its position matters); the remaining fields become the [`ColumnSchema`].
//!
//! Malformed data rows are dropped, not fatal. Each drop is logged with
//! `tracing::warn!` and recorded in the [`ParseReport`] returned to the caller.
//! A blank line between data rows is a one-field row and is dropped the same way.

use crate::error::{AnalysisError, AppResult};
use crate::measurement_types::{ColumnSchema, Record, Table};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Why a data row was left out of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropReason {
    /// The row does not have one field per header column.
    FieldCount {
        /// Header width.
        expected: usize,
        /// Fields on the row; a blank line counts as one.
        found: usize,
    },
    /// The first field is not a finite number.
    InvalidFrequency {
        /// The field as read, quotes stripped.
        value: String,
    },
    /// A channel field is not a finite number. Only the first offending
    /// column is reported.
    InvalidValue {
        /// Header name of the offending column.
        column: String,
        /// The field as read, quotes stripped.
        value: String,
    },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::FieldCount { expected, found } => {
                write!(f, "has {found} values but expected {expected}")
            }
            DropReason::InvalidFrequency { value } => {
                write!(f, "invalid frequency value '{value}'")
            }
            DropReason::InvalidValue { column, value } => {
                write!(f, "invalid response value in column {column}: '{value}'")
            }
        }
    }
}

/// A data row that did not make it into the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRow {
    /// 1-based line number in the source text (the header is line 1).
    pub line: u64,
    /// Why the row was dropped.
    pub reason: DropReason,
}

/// Row-level diagnostics for one parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseReport {
    /// Number of data rows seen (valid + dropped).
    pub total_rows: usize,
    /// Dropped rows in source order.
    pub dropped: Vec<DroppedRow>,
}

impl ParseReport {
    /// Rows that made it into the table.
    pub fn valid_rows(&self) -> usize {
        self.total_rows - self.dropped.len()
    }

    /// Number of dropped rows.
    pub fn dropped_rows(&self) -> usize {
        self.dropped.len()
    }
}

/// Output of a successful parse.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Valid rows in source order.
    pub table: Table,
    /// Channel names from the header.
    pub columns: ColumnSchema,
    /// Row accounting, including every dropped row.
    pub report: ParseReport,
}

/// Parses delimited text into a table plus its column schema.
///
/// # Errors
///
/// * [`AnalysisError::Format`] if the text holds no header line, if the header
///   has fewer than two columns, or if the header repeats or omits a channel name.
/// * [`AnalysisError::EmptyResult`] if the header is followed by no data rows,
///   or every data row was dropped.
pub fn parse(raw: &str) -> AppResult<ParsedTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(raw.trim().as_bytes());

    let mut rows = reader.records();

    let header_record = match rows.next() {
        Some(record) => record?,
        None => {
            return Err(AnalysisError::Format(
                "CSV must have at least 2 rows (header + data)".into(),
            ))
        }
    };
    let header: Vec<String> = header_record.iter().map(clean_field).collect();
    if header.len() < 2 {
        return Err(AnalysisError::Format(
            "CSV must have at least 2 columns (frequency + responses)".into(),
        ));
    }
    let columns = ColumnSchema::new(header[1..].to_vec())?;

    let mut records = Vec::new();
    let mut report = ParseReport::default();
    let mut last_line = line_of(&header_record, 0);

    for row in rows {
        let row = row?;
        let line = line_of(&row, report.total_rows + 1);

        // The reader skips empty lines; they still count as one-field rows.
        for blank in last_line + 1..line {
            report.total_rows += 1;
            drop_row(
                &mut report,
                blank,
                DropReason::FieldCount {
                    expected: header.len(),
                    found: 1,
                },
            );
        }
        last_line = line;

        report.total_rows += 1;
        match parse_row(&row, &header) {
            Ok(record) => records.push(record),
            Err(reason) => drop_row(&mut report, line, reason),
        }
    }

    if records.is_empty() {
        return Err(AnalysisError::EmptyResult);
    }

    info!(
        rows = records.len(),
        dropped = report.dropped_rows(),
        channels = columns.len(),
        "Parsed CSV: {} rows, {} response columns",
        records.len(),
        columns.len()
    );
    debug!(columns = ?columns.names(), "response columns");

    Ok(ParsedTable {
        table: Table::new(records),
        columns,
        report,
    })
}

/// Parses a single numeric token. Non-finite values (`NaN`, `inf`) and
/// anything that is not a plain decimal or exponential literal are rejected.
pub fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_row(row: &StringRecord, header: &[String]) -> Result<Record, DropReason> {
    if row.len() != header.len() {
        return Err(DropReason::FieldCount {
            expected: header.len(),
            found: row.len(),
        });
    }

    let mut fields = row.iter().map(clean_field);
    // Length checked above, so the first field exists.
    let freq_field = fields.next().unwrap_or_default();
    let frequency = parse_number(&freq_field).ok_or(DropReason::InvalidFrequency {
        value: freq_field.clone(),
    })?;

    let mut record = Record::new(frequency);
    for (column, field) in header[1..].iter().zip(fields) {
        let value = parse_number(&field).ok_or_else(|| DropReason::InvalidValue {
            column: column.clone(),
            value: field.clone(),
        })?;
        record.insert(column.clone(), value);
    }
    Ok(record)
}

fn drop_row(report: &mut ParseReport, line: u64, reason: DropReason) {
    warn!(line, %reason, "skipping row {line}: {reason}");
    report.dropped.push(DroppedRow { line, reason });
}

fn clean_field(field: &str) -> String {
    field.trim().trim_matches('"').trim().to_string()
}

/// Source line of a data row; falls back to counting rows when the reader
/// reports no position.
fn line_of(row: &StringRecord, row_index: usize) -> u64 {
    row.position()
        .map(|p| p.line())
        .unwrap_or(row_index as u64 + 1)
}
