//! End-to-end analysis: parse → classify → derive RSS → scale → band RMS.
//!
//! [`AnalysisPipeline`] owns an [`AnalysisConfig`] and runs the stages in order,
//! keeping every intermediate result in the returned [`AnalysisRun`]. Stages are
//! pure functions over tables; the pipeline itself holds no mutable state, so
//! one pipeline can serve any number of runs.
//!
//! A [`DataObserver`] can be attached to be told about each freshly parsed
//! table, which is where a caller keeps its own copy of the unprocessed data.

use crate::config::{AnalysisConfig, ReportConfig};
use crate::data::bands::{aggregate_bands, validate_bands, RmsResult};
use crate::data::classifier::{classify, source_node_ids, AxisGroups};
use crate::data::diagnostics::{diagnose, Diagnostic};
use crate::data::export::{ReportMetadata, ReportPayload};
use crate::data::parser::{parse, ParseReport, ParsedTable};
use crate::data::rss::{derive_rss, node_ids, RssDerivation};
use crate::data::scale::{scale, ScaleSetting};
use crate::error::AppResult;
use crate::measurement_types::{ColumnSchema, Table};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Receives the parsed table of every successful parse.
///
/// Called exactly once per successful [`AnalysisPipeline::run_with_observer`],
/// before any derivation, and never when parsing fails.
pub trait DataObserver {
    /// Called with the table exactly as parsed.
    fn on_data_parsed(&mut self, table: &Table, columns: &ColumnSchema, source_label: &str);
}

impl<F> DataObserver for F
where
    F: FnMut(&Table, &ColumnSchema, &str),
{
    fn on_data_parsed(&mut self, table: &Table, columns: &ColumnSchema, source_label: &str) {
        self(table, columns, source_label)
    }
}

struct NoopObserver;

impl DataObserver for NoopObserver {
    fn on_data_parsed(&mut self, _: &Table, _: &ColumnSchema, _: &str) {}
}

/// Row and channel counts for a caller's status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    /// Rows kept by the parser.
    pub valid_rows: usize,
    /// Rows the parser skipped.
    pub dropped_rows: usize,
    /// Derived RSS channels.
    pub rss_channels: usize,
}

/// Every intermediate and final result of one run.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    /// File name or other label of the input.
    pub source_label: String,
    /// Row accounting from the parser.
    pub parse_report: ParseReport,
    /// Table as parsed, before derivation.
    pub table: Table,
    /// Source channel names.
    pub columns: ColumnSchema,
    /// Axis groups found in `columns`.
    pub groups: AxisGroups,
    /// Source channels plus derived RSS channels, unscaled.
    pub derived: Table,
    /// Derived RSS channel names in discovery order.
    pub rss_columns: Vec<String>,
    /// `derived` with every channel divided by the scale factor.
    pub scaled: Table,
    /// Band RMS of the scaled RSS channels.
    pub rms: RmsResult,
    /// Threshold findings over the unscaled channels.
    pub diagnostics: Vec<Diagnostic>,
    /// Scale applied to `scaled`.
    pub scale: ScaleSetting,
    report: ReportConfig,
    node_titles: BTreeMap<u64, String>,
}

impl AnalysisRun {
    /// Counts for a status line.
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            valid_rows: self.parse_report.valid_rows(),
            dropped_rows: self.parse_report.dropped_rows(),
            rss_channels: self.rss_columns.len(),
        }
    }

    /// Source channels in schema order followed by the RSS channels.
    pub fn channels(&self) -> Vec<&str> {
        all_channels(&self.columns, &self.rss_columns)
    }

    /// Numeric node ids of the derived RSS channels.
    pub fn node_ids(&self) -> Vec<u64> {
        node_ids(&self.rss_columns)
    }

    /// The structured payload consumed by report tooling.
    pub fn report_payload(&self) -> ReportPayload {
        let (low, high) = self.table.frequency_range().unwrap_or((0.0, 0.0));
        ReportPayload {
            metadata: ReportMetadata {
                file_name: self.source_label.clone(),
                start_node: self.report.start_node,
                end_node: self.report.end_node,
                magnification_factor: self.scale.factor,
                unit_label: self.scale.unit_label.clone(),
                node_count: self.rss_columns.len(),
                frequency_range: [low, high],
            },
            plot_data: self.scaled.clone(),
            rss_columns: self.rss_columns.clone(),
            rms_data: self.rms.clone(),
            node_titles: self.node_titles.clone(),
        }
    }
}

fn all_channels<'a>(columns: &'a ColumnSchema, rss_columns: &'a [String]) -> Vec<&'a str> {
    columns
        .iter()
        .chain(rss_columns)
        .map(String::as_str)
        .collect()
}

/// Runs the analysis stages with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    /// Pipeline with a fixed configuration.
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// The configuration runs use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Parses `raw` and runs every stage.
    pub fn run(&self, raw: &str, source_label: &str) -> AppResult<AnalysisRun> {
        self.run_with_observer(raw, source_label, &mut NoopObserver)
    }

    /// [`run`](Self::run), notifying `observer` once the table is parsed.
    ///
    /// The scale factor and band definitions are checked before parsing, so
    /// an invalid setting fails without touching the input or the observer.
    #[instrument(skip(self, raw, observer), fields(bytes = raw.len()))]
    pub fn run_with_observer(
        &self,
        raw: &str,
        source_label: &str,
        observer: &mut dyn DataObserver,
    ) -> AppResult<AnalysisRun> {
        self.check_settings()?;
        let ParsedTable {
            table,
            columns,
            report,
        } = parse(raw)?;
        observer.on_data_parsed(&table, &columns, source_label);
        self.analyze(table, columns, report, source_label)
    }

    /// Runs every stage after parsing on an already-built table.
    pub fn run_table(
        &self,
        table: Table,
        columns: ColumnSchema,
        source_label: &str,
    ) -> AppResult<AnalysisRun> {
        self.check_settings()?;
        let report = ParseReport {
            total_rows: table.len(),
            dropped: Vec::new(),
        };
        self.analyze(table, columns, report, source_label)
    }

    fn check_settings(&self) -> AppResult<()> {
        self.config.scale.validate()?;
        validate_bands(&self.config.bands)
    }

    fn analyze(
        &self,
        table: Table,
        columns: ColumnSchema,
        parse_report: ParseReport,
        source_label: &str,
    ) -> AppResult<AnalysisRun> {
        let config = &self.config;

        let groups = classify(&columns, config.classifier.axis_tag_mode);
        debug!(
            groups = groups.len(),
            source_nodes = source_node_ids(&columns).len(),
            "classified channels"
        );
        let RssDerivation {
            table: derived,
            rss_columns,
        } = derive_rss(&table, &groups, config.classifier.collision_policy)?;

        let scaled = scale(&derived, config.scale.factor)?;
        let rms = aggregate_bands(&scaled, &rss_columns, &config.bands);

        let diagnostics = diagnose(
            &derived,
            &all_channels(&columns, &rss_columns),
            &config.diagnostics,
        );
        debug!(findings = diagnostics.len(), "diagnostics complete");

        let run = AnalysisRun {
            source_label: source_label.to_string(),
            parse_report,
            table,
            columns,
            groups,
            derived,
            rss_columns,
            scaled,
            rms,
            diagnostics,
            scale: config.scale.clone(),
            report: config.report,
            node_titles: config.nodes.titles_by_id()?,
        };

        let summary = run.summary();
        info!(
            source = source_label,
            valid_rows = summary.valid_rows,
            dropped_rows = summary.dropped_rows,
            rss_channels = summary.rss_channels,
            "Loaded {} rows with {} RSS channels",
            summary.valid_rows,
            summary.rss_channels
        );
        Ok(run)
    }
}
