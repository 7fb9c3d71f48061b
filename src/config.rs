//! Analysis configuration using Figment.
//!
//! Configuration is layered from:
//! 1. a TOML file (`config/vibration_rss.toml` unless a path is given)
//! 2. environment variables prefixed with `VIBRATION_RSS_`, nested keys
//!    separated by a double underscore
//!
//! Every field has a default, so a missing file or an empty one yields the
//! standard three-band, ×1000 setup.
//!
//! # Example
//! ```no_run
//! use vibration_rss::config::AnalysisConfig;
//!
//! // VIBRATION_RSS_SCALE__FACTOR=10 overrides [scale] factor
//! let config = AnalysisConfig::load()?;
//! config.validate()?;
//! println!("scale factor: {}", config.scale.factor);
//! # Ok::<(), vibration_rss::error::AnalysisError>(())
//! ```

use crate::data::bands::{default_bands, validate_bands, BandDef};
use crate::data::classifier::AxisTagMode;
use crate::data::diagnostics::DiagnosticsConfig;
use crate::data::rss::CollisionPolicy;
use crate::data::scale::ScaleSetting;
use crate::error::{AnalysisError, AppResult};
use crate::logging::{OutputFormat, LOG_LEVELS};
use crate::validation::{is_finite, is_not_empty};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Path read by [`AnalysisConfig::load`].
pub const DEFAULT_CONFIG_PATH: &str = "config/vibration_rss.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "VIBRATION_RSS_";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Name and logging.
    pub application: ApplicationConfig,
    /// Axis tag matching and collision handling.
    pub classifier: ClassifierConfig,
    /// Magnification factor and unit label.
    pub scale: ScaleSetting,
    /// Report metadata node range.
    pub report: ReportConfig,
    /// Frequency bands, in report order.
    pub bands: Vec<BandDef>,
    /// Threshold checks.
    pub diagnostics: DiagnosticsConfig,
    /// Display titles per node id.
    pub nodes: NodesConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            classifier: ClassifierConfig::default(),
            scale: ScaleSetting::default(),
            report: ReportConfig::default(),
            bands: default_bands(),
            diagnostics: DiagnosticsConfig::default(),
            nodes: NodesConfig::default(),
        }
    }
}

/// Application-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// trace, debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: OutputFormat,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: OutputFormat::default(),
        }
    }
}

/// Channel classification and RSS derivation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Which axis tag spellings are recognised.
    pub axis_tag_mode: AxisTagMode,
    /// What to do when two groups map to one RSS name.
    pub collision_policy: CollisionPolicy,
}

/// Node range advertised in the report metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_start_node")]
    pub start_node: u64,
    #[serde(default = "default_end_node")]
    pub end_node: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            start_node: default_start_node(),
            end_node: default_end_node(),
        }
    }
}

/// Human-readable node titles, keyed by node id.
///
/// Keys stay strings in the file (TOML keys always are) and are parsed by
/// [`NodesConfig::titles_by_id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodesConfig {
    #[serde(default = "default_node_titles")]
    pub titles: BTreeMap<String, String>,
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            titles: default_node_titles(),
        }
    }
}

impl NodesConfig {
    /// Titles keyed by numeric node id.
    pub fn titles_by_id(&self) -> AppResult<BTreeMap<u64, String>> {
        self.titles
            .iter()
            .map(|(id, title)| {
                id.trim()
                    .parse::<u64>()
                    .map(|id| (id, title.clone()))
                    .map_err(|_| {
                        AnalysisError::Configuration(format!(
                            "node title key '{id}' is not a numeric node id"
                        ))
                    })
            })
            .collect()
    }
}

fn default_name() -> String {
    "Vibration RSS".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_start_node() -> u64 {
    8000001
}

fn default_end_node() -> u64 {
    8000045
}

/// Titles of the standard engine-mount and swing-arm bracket nodes.
pub fn default_node_titles() -> BTreeMap<String, String> {
    [
        (8000001, "Engine Mount Front Top LH"),
        (8000002, "Engine Mount Front Top RH"),
        (8000003, "Engine Mount Front Bottom LH"),
        (8000004, "Engine Mount Front Bottom RH"),
        (8000005, "Engine Mount Rear Top LH"),
        (8000006, "Engine Mount Rear Top RH"),
        (8000007, "Engine Mount Rear Bottom LH"),
        (8000008, "Engine Mount Rear Bottom RH"),
        (8000013, "Swingarn bracket LH Top"),
        (8000014, "Swingarn bracket RH Top"),
        (8000015, "Swingarn bracket LH Bottom"),
        (8000016, "Swingarn bracket RH Bottom"),
    ]
    .into_iter()
    .map(|(id, title)| (id.to_string(), title.to_string()))
    .collect()
}

impl AnalysisConfig {
    /// Loads [`DEFAULT_CONFIG_PATH`] merged with environment overrides.
    /// A missing file is not an error.
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads a specific file merged with environment overrides.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Ok(Self::figment(Toml::file(path.as_ref())).extract()?)
    }

    /// Parses TOML text merged with environment overrides.
    pub fn from_toml_str(toml: &str) -> AppResult<Self> {
        Ok(Self::figment(Toml::string(toml)).extract()?)
    }

    fn figment(file: figment::providers::Data<Toml>) -> Figment {
        Figment::new()
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Replaces the scale setting, deriving the unit label from the presets.
    pub fn with_scale_factor(mut self, factor: f64) -> Self {
        self.scale = ScaleSetting::from_factor(factor);
        self
    }

    /// Semantic checks that deserialization cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if !LOG_LEVELS.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(AnalysisError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        self.scale.validate()?;
        is_not_empty(&self.scale.unit_label)
            .map_err(|e| AnalysisError::Configuration(format!("scale.unit_label {e}")))?;

        validate_bands(&self.bands)?;

        let d = &self.diagnostics;
        for (name, value) in [
            ("warning_rms", d.warning_rms),
            ("critical_rms", d.critical_rms),
            ("low_peak_hz", d.low_peak_hz),
            ("high_peak_hz", d.high_peak_hz),
        ] {
            is_finite(value)
                .map_err(|e| AnalysisError::Configuration(format!("diagnostics.{name} {e}")))?;
        }
        if d.warning_rms > d.critical_rms {
            return Err(AnalysisError::Configuration(format!(
                "diagnostics.warning_rms ({}) exceeds critical_rms ({})",
                d.warning_rms, d.critical_rms
            )));
        }

        if self.report.start_node > self.report.end_node {
            return Err(AnalysisError::Configuration(format!(
                "report.start_node ({}) is after end_node ({})",
                self.report.start_node, self.report.end_node
            )));
        }

        self.nodes.titles_by_id()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scale.factor, 1000.0);
        assert_eq!(config.scale.unit_label, "n/*2");
        assert_eq!(config.bands.len(), 3);
        assert_eq!(config.report.start_node, 8000001);
        assert_eq!(config.report.end_node, 8000045);
        assert_eq!(config.nodes.titles.len(), 12);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            [scale]
            factor = 10.0

            [classifier]
            axis_tag_mode = "strict_upper"
            "#,
        )
        .unwrap();
        assert_eq!(config.scale.factor, 10.0);
        // label not given: the field default applies, not the preset
        assert_eq!(config.scale.unit_label, "n/*2");
        assert_eq!(config.classifier.axis_tag_mode, AxisTagMode::StrictUpper);
        assert_eq!(config.classifier.collision_policy, CollisionPolicy::LastWriteWins);
        assert_eq!(config.application.log_level, "info");
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AnalysisConfig::default();
        config.application.log_level = "verbose".into();
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_scale_factor_rejected() {
        let config = AnalysisConfig::default().with_scale_factor(0.0);
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_with_scale_factor_uses_preset_label() {
        let config = AnalysisConfig::default().with_scale_factor(10000.0);
        assert_eq!(config.scale.unit_label, "[d]={/*2}");
    }

    #[test]
    fn test_threshold_and_node_ordering() {
        let mut config = AnalysisConfig::default();
        config.diagnostics.warning_rms = 3.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.report.start_node = 9;
        config.report.end_node = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_node_titles_need_numeric_keys() {
        let mut config = AnalysisConfig::default();
        config
            .nodes
            .titles
            .insert("front".into(), "Front".into());
        assert!(config.validate().is_err());

        let titles = AnalysisConfig::default().nodes.titles_by_id().unwrap();
        assert_eq!(titles[&8000013], "Swingarn bracket LH Top");
    }
}
