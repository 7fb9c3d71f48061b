//! CSV export and the structured report payload.
//!
//! The CSV form mirrors what the parser reads: a `Frequency` header followed by
//! the requested channels, one row per record, absent values written as `0`.
//!
//! The report payload is the JSON document consumed by external report tooling.
//! Its field names are a stable contract.

use crate::data::bands::RmsResult;
use crate::error::{AnalysisError, AppResult};
use crate::measurement_types::Table;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Header label of the frequency column in exported CSV.
pub const FREQUENCY_HEADER: &str = "Frequency";

/// Writes `table` as CSV with the given channel columns.
pub fn write_csv<W: Write, S: AsRef<str>>(
    writer: W,
    table: &Table,
    columns: &[S],
) -> AppResult<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = Vec::with_capacity(columns.len() + 1);
    header.push(FREQUENCY_HEADER);
    header.extend(columns.iter().map(|c| c.as_ref()));
    csv.write_record(&header)?;

    for record in table {
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(record.frequency.to_string());
        row.extend(
            columns
                .iter()
                .map(|c| record.value_or_zero(c.as_ref()).to_string()),
        );
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

/// [`write_csv`] into a string.
pub fn to_csv_string<S: AsRef<str>>(table: &Table, columns: &[S]) -> AppResult<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, table, columns)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes a CSV export to `path`, creating parent directories as needed.
pub fn export_csv_file<S: AsRef<str>>(
    path: impl AsRef<Path>,
    table: &Table,
    columns: &[S],
) -> AppResult<()> {
    let path = path.as_ref();
    let file = create_file(path)?;
    write_csv(BufWriter::new(file), table, columns)?;
    info!(rows = table.len(), "CSV export written to '{}'", path.display());
    Ok(())
}

/// Export file name for a source label: `run.csv` becomes `run_with_RSS.csv`.
pub fn export_file_name(source_label: &str) -> String {
    format!("{}_with_RSS.csv", file_stem(source_label))
}

/// Report file name for a source label: `run.csv` becomes `run_ppt_data.json`.
pub fn report_file_name(source_label: &str) -> String {
    format!("{}_ppt_data.json", file_stem(source_label))
}

fn file_stem(label: &str) -> &str {
    let n = label.len();
    if n >= 4 && label.is_char_boundary(n - 4) && label[n - 4..].eq_ignore_ascii_case(".csv") {
        &label[..n - 4]
    } else {
        label
    }
}

fn create_file(path: &Path) -> AppResult<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    File::create(path).map_err(AnalysisError::Io)
}

/// Metadata block of the report payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Source label of the run.
    pub file_name: String,
    /// First node of the advertised range.
    pub start_node: u64,
    /// Last node of the advertised range.
    pub end_node: u64,
    /// Scale factor the plot data was divided by.
    pub magnification_factor: f64,
    /// Unit of the plot data.
    pub unit_label: String,
    /// Number of RSS channels.
    pub node_count: usize,
    /// `[min, max]` frequency of the source table; `[0, 0]` when empty.
    pub frequency_range: [f64; 2],
}

/// Everything report tooling needs from one analysis run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    /// Run metadata.
    pub metadata: ReportMetadata,
    /// Scaled records including the derived RSS channels.
    pub plot_data: Table,
    /// Derived RSS channel names.
    pub rss_columns: Vec<String>,
    /// RMS per RSS channel, keyed by band report key.
    #[serde(serialize_with = "serialize_keyed_rms")]
    pub rms_data: RmsResult,
    /// Display title per node id.
    pub node_titles: BTreeMap<u64, String>,
}

fn serialize_keyed_rms<S: Serializer>(rms: &RmsResult, serializer: S) -> Result<S::Ok, S::Error> {
    rms.keyed().serialize(serializer)
}

impl ReportPayload {
    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes pretty JSON to `writer`.
    pub fn write_json<W: Write>(&self, writer: W) -> AppResult<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Writes the payload as pretty JSON to `path`.
    pub fn write_file(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(create_file(path)?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        info!(
            channels = self.rss_columns.len(),
            "Report data written to '{}'",
            path.display()
        );
        Ok(())
    }
}
