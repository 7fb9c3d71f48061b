//! # Vibration RSS Analysis Library
//!
//! This crate turns a frequency-response sweep exported as delimited text into
//! per-node vibration magnitudes and band-limited RMS energy. The library holds
//! all of the analysis; the `vibration-rss` binary (`main.rs`) only handles files,
//! configuration and logging setup.
//!
//! ## Crate Structure
//!
//! - **`config`**: `AnalysisConfig`, loaded from TOML and `VIBRATION_RSS_*` environment
//!   variables with `figment`, then validated.
//! - **`data`**: the processing stages. `parser` reads the text into a table, `classifier`
//!   groups X/Y/Z channels per node, `rss` derives the vector magnitude channels, `scale`
//!   applies the magnification factor and `bands` computes RMS per frequency band.
//!   `diagnostics`, `export` and `sample` build on those.
//! - **`error`**: the `AnalysisError` enum shared by every fallible operation.
//! - **`logging`**: `tracing-subscriber` initialisation.
//! - **`measurement_types`**: `Record`, `Table` and `ColumnSchema`.
//! - **`pipeline`**: `AnalysisPipeline`, which runs the stages in order and hands the
//!   parsed table to an optional `DataObserver`.
//! - **`validation`**: small numeric and string validators used by configuration checks.
//!
//! ## Example
//! ```
//! use vibration_rss::pipeline::AnalysisPipeline;
//!
//! let csv = "Frequency,Node_1_X,Node_1_Y,Node_1_Z\n50,3000,4000,0\n";
//! let run = AnalysisPipeline::default().run(csv, "sweep.csv")?;
//! assert_eq!(run.rss_columns, ["RSS_1"]);
//! assert_eq!(run.rms.get("RSS_1", "1-100Hz"), Some(5.0));
//! # Ok::<(), vibration_rss::error::AnalysisError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod measurement_types;
pub mod pipeline;
pub mod validation;
