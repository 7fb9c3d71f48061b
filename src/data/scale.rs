//! Unit/scale adapter: divides channel values by a magnification factor.

use crate::error::{AnalysisError, AppResult};
use crate::measurement_types::Table;
use crate::validation::is_non_zero_finite;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unit label used when a factor has no preset.
pub const DEFAULT_UNIT_LABEL: &str = "n/*2";

/// A magnification factor and the unit label the scaled values are shown in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnificationPreset {
    /// Divisor applied to channel values.
    pub factor: f64,
    /// Unit shown for scaled values.
    pub unit_label: &'static str,
}

/// The unit conversions offered to report consumers.
pub const MAGNIFICATION_PRESETS: [MagnificationPreset; 4] = [
    MagnificationPreset {
        factor: 10000.0,
        unit_label: "[d]={/*2}",
    },
    MagnificationPreset {
        factor: 1000.0,
        unit_label: "n/*2",
    },
    MagnificationPreset {
        factor: 10.0,
        unit_label: "cn/*2",
    },
    MagnificationPreset {
        factor: 1.0,
        unit_label: "in/*2",
    },
];

/// Unit label of the preset matching `factor`, or [`DEFAULT_UNIT_LABEL`].
pub fn unit_label_for(factor: f64) -> &'static str {
    MAGNIFICATION_PRESETS
        .iter()
        .find(|p| p.factor == factor)
        .map_or(DEFAULT_UNIT_LABEL, |p| p.unit_label)
}

/// Scale factor plus its display unit, as configured for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSetting {
    /// Divisor applied to channel values; finite and non-zero.
    #[serde(default = "default_factor")]
    pub factor: f64,
    /// Unit shown for scaled values.
    #[serde(default = "default_unit_label")]
    pub unit_label: String,
}

fn default_factor() -> f64 {
    1000.0
}

fn default_unit_label() -> String {
    DEFAULT_UNIT_LABEL.to_string()
}

impl Default for ScaleSetting {
    fn default() -> Self {
        Self::from_factor(default_factor())
    }
}

impl ScaleSetting {
    /// Setting whose unit label comes from the preset table.
    pub fn from_factor(factor: f64) -> Self {
        Self {
            factor,
            unit_label: unit_label_for(factor).to_string(),
        }
    }

    /// Fails with [`AnalysisError::InvalidScale`] for zero or non-finite factors.
    pub fn validate(&self) -> AppResult<()> {
        is_non_zero_finite(self.factor).map_err(|_| AnalysisError::InvalidScale(self.factor))
    }
}

/// Returns a copy of `table` with every channel value divided by `factor`.
/// Frequencies are never scaled.
///
/// # Errors
///
/// [`AnalysisError::InvalidScale`] if `factor` is zero, NaN or infinite.
pub fn scale(table: &Table, factor: f64) -> AppResult<Table> {
    is_non_zero_finite(factor).map_err(|_| AnalysisError::InvalidScale(factor))?;
    debug!(factor, rows = table.len(), "scaling channel values");
    Ok(table.iter().map(|r| r.map_values(|v| v / factor)).collect())
}
