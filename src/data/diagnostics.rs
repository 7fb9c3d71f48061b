//! Threshold diagnostics over whole sweeps.
//!
//! Each channel's RMS over the full sweep is compared against a warning and a
//! critical threshold, and the frequency at which the first channel peaks is
//! checked for very low or very high resonances.

use crate::data::bands::rms;
use crate::measurement_types::Table;
use serde::{Deserialize, Serialize};

/// Severity of a diagnostic finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No threshold exceeded.
    Good,
    /// Warning threshold exceeded.
    Warning,
    /// Critical threshold exceeded.
    Critical,
}

/// One diagnostic finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// How serious the finding is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Measured value, when the finding has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Threshold that was crossed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

/// Thresholds used by [`diagnose`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Whole-sweep RMS above which a channel is flagged as elevated.
    pub warning_rms: f64,
    /// Whole-sweep RMS above which a channel is flagged as critical.
    pub critical_rms: f64,
    /// Peak frequencies below this are reported as low-frequency resonance.
    pub low_peak_hz: f64,
    /// Peak frequencies above this are reported as high-frequency content.
    pub high_peak_hz: f64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            warning_rms: 1.0,
            critical_rms: 2.0,
            low_peak_hz: 10.0,
            high_peak_hz: 150.0,
        }
    }
}

/// Runs the threshold checks over `channels` of `table`.
///
/// Returns nothing for an empty table or channel list, and a single
/// [`Severity::Good`] entry when no check fires.
pub fn diagnose<S: AsRef<str>>(
    table: &Table,
    channels: &[S],
    config: &DiagnosticsConfig,
) -> Vec<Diagnostic> {
    if table.is_empty() || channels.is_empty() {
        return Vec::new();
    }

    let mut results = Vec::new();

    for channel in channels {
        let channel = channel.as_ref();
        let value = rms(table.column(channel));
        if value > config.critical_rms {
            results.push(Diagnostic {
                severity: Severity::Critical,
                message: format!("High vibration detected in {channel}"),
                value: Some(value),
                threshold: Some(config.critical_rms),
            });
        } else if value > config.warning_rms {
            results.push(Diagnostic {
                severity: Severity::Warning,
                message: format!("Elevated vibration in {channel}"),
                value: Some(value),
                threshold: Some(config.warning_rms),
            });
        }
    }

    if let Some(peak) = peak_frequency(table, channels[0].as_ref()) {
        if peak > 0.0 {
            if peak < config.low_peak_hz {
                results.push(Diagnostic {
                    severity: Severity::Warning,
                    message: format!("Low frequency resonance at {peak:.1} Hz"),
                    value: Some(peak),
                    threshold: None,
                });
            } else if peak > config.high_peak_hz {
                results.push(Diagnostic {
                    severity: Severity::Warning,
                    message: format!("High frequency content at {peak:.1} Hz"),
                    value: Some(peak),
                    threshold: None,
                });
            }
        }
    }

    if results.is_empty() {
        results.push(Diagnostic {
            severity: Severity::Good,
            message: "All vibration levels within normal range".into(),
            value: None,
            threshold: None,
        });
    }
    results
}

/// Frequency of the first record holding the largest value of `channel`.
pub fn peak_frequency(table: &Table, channel: &str) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for record in table {
        let value = record.value_or_zero(channel);
        match best {
            Some((max, _)) if value <= max => {}
            _ => best = Some((value, record.frequency)),
        }
    }
    best.map(|(_, freq)| freq)
}
