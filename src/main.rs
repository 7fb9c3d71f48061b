//! CLI Entry Point for vibration-rss
//!
//! Provides a command-line interface for:
//! - Analyzing a frequency-response CSV (RSS channels + band RMS)
//! - Writing synthetic sample sweeps
//!
//! # Usage
//!
//! Analyze a sweep, writing the RSS export and the report data:
//! ```bash
//! vibration-rss analyze sweep.csv --scale 1000 --export-csv --report out/sweep_ppt_data.json
//! ```
//!
//! Generate sample data:
//! ```bash
//! vibration-rss sample --kind mount --seed 7 --out sample_data.csv
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use vibration_rss::config::AnalysisConfig;
use vibration_rss::data::diagnostics::Severity;
use vibration_rss::data::export::{export_csv_file, export_file_name, report_file_name};
use vibration_rss::data::sample::{mount_sweep, sdof_sweep, SdofParams};
use vibration_rss::logging::{self, LoggingConfig};
use vibration_rss::pipeline::{AnalysisPipeline, AnalysisRun};

#[derive(Parser)]
#[command(name = "vibration-rss")]
#[command(about = "RSS vibration magnitudes and band RMS from frequency-response CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a frequency-response CSV file
    Analyze {
        /// Path to the CSV file (frequency column first)
        csv: PathBuf,

        /// Configuration file (defaults to config/vibration_rss.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Magnification factor applied before band RMS
        #[arg(long)]
        scale: Option<f64>,

        /// Write the table with RSS channels; defaults to <stem>_with_RSS.csv
        /// next to the input
        #[arg(long, num_args = 0..=1)]
        export_csv: Option<Option<PathBuf>>,

        /// Write the report data JSON; defaults to <stem>_ppt_data.json next
        /// to the input
        #[arg(long, num_args = 0..=1)]
        report: Option<Option<PathBuf>>,
    },

    /// Write a synthetic sample sweep as CSV
    Sample {
        #[arg(long, value_enum, default_value_t = SampleKind::Mount)]
        kind: SampleKind,

        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output CSV path
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SampleKind {
    /// Engine-mount layout, 0-300 Hz, lowercase axis tags
    Mount,
    /// Damped single-degree-of-freedom response, 0-200 Hz
    Sdof,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            csv,
            config,
            scale,
            export_csv,
            report,
        } => analyze(&csv, config.as_deref(), scale, export_csv, report),
        Commands::Sample { kind, seed, out } => sample(kind, seed, &out),
    }
}

fn load_config(path: Option<&Path>, scale: Option<f64>) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => AnalysisConfig::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AnalysisConfig::load()?,
    };
    if let Some(factor) = scale {
        config = config.with_scale_factor(factor);
    }
    config.validate()?;
    Ok(config)
}

fn analyze(
    csv: &Path,
    config: Option<&Path>,
    scale: Option<f64>,
    export_csv: Option<Option<PathBuf>>,
    report: Option<Option<PathBuf>>,
) -> Result<()> {
    let config = load_config(config, scale)?;
    logging::init_from_config(&config)?;

    let raw = std::fs::read_to_string(csv)
        .with_context(|| format!("reading {}", csv.display()))?;
    let source_label = csv
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| csv.display().to_string());

    info!(path = %csv.display(), "analyzing");
    let run = AnalysisPipeline::new(config).run(&raw, &source_label)?;
    print_run(&run);

    let beside_input = |name: String| csv.with_file_name(name);

    if let Some(path) = export_csv {
        let path = path.unwrap_or_else(|| beside_input(export_file_name(&source_label)));
        export_csv_file(&path, &run.derived, &run.channels())?;
        println!("RSS export written to {}", path.display());
    }

    if let Some(path) = report {
        let path = path.unwrap_or_else(|| beside_input(report_file_name(&source_label)));
        run.report_payload().write_file(&path)?;
        println!("Report data written to {}", path.display());
    }

    Ok(())
}

fn print_run(run: &AnalysisRun) {
    let summary = run.summary();
    println!(
        "Loaded {} rows with {} RSS channels from {}",
        summary.valid_rows, summary.rss_channels, run.source_label
    );
    if summary.dropped_rows > 0 {
        println!("  {} rows skipped (see warnings)", summary.dropped_rows);
    }

    if !run.rms.is_empty() {
        println!();
        println!(
            "RMS by band ({} x{}):",
            run.scale.unit_label, run.scale.factor
        );
        for channel in run.rms.channels() {
            let bands: Vec<String> = channel
                .bands
                .iter()
                .map(|b| format!("{} {:.6}", b.label, b.rms))
                .collect();
            println!("  {:<16} {}", channel.channel, bands.join("  "));
        }
    }

    println!();
    for diagnostic in &run.diagnostics {
        let tag = match diagnostic.severity {
            Severity::Good => "ok",
            Severity::Warning => "warning",
            Severity::Critical => "CRITICAL",
        };
        println!("  [{tag}] {}", diagnostic.message);
    }
}

fn sample(kind: SampleKind, seed: u64, out: &Path) -> Result<()> {
    logging::init(LoggingConfig::default())?;
    let data = match kind {
        SampleKind::Mount => mount_sweep(seed)?,
        SampleKind::Sdof => sdof_sweep(&SdofParams::default(), seed)?,
    };
    export_csv_file(out, &data.table, data.columns.names())?;
    println!(
        "Wrote {} rows x {} channels to {}",
        data.table.len(),
        data.columns.len(),
        out.display()
    );
    Ok(())
}
