//! Band aggregator: RMS energy per channel over fixed frequency intervals.
//!
//! A band is half-open, `[low, high)`, except that a band may exclude its lower
//! bound too. The default lowest band is `(0, 100)`, which keeps DC rows
//! (frequency `0`) out of every band.
//!
//! For each channel and band the RMS is `sqrt(sum(value²) / count)` over the
//! records whose frequency falls in the band. An empty band yields `0`, and a
//! channel missing from a record contributes `0` for that record.

use crate::error::{AnalysisError, AppResult};
use crate::measurement_types::Table;
use crate::validation::is_ordered_range;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named frequency interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandDef {
    /// Display label, e.g. `1-100Hz`.
    pub label: String,
    /// Key used in report payloads, e.g. `DNS_1_100`. Falls back to `label`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Lower bound in Hz.
    pub low: f64,
    /// Upper bound in Hz, always exclusive.
    pub high: f64,
    /// Whether a frequency equal to `low` belongs to the band.
    #[serde(default = "default_low_inclusive")]
    pub low_inclusive: bool,
}

fn default_low_inclusive() -> bool {
    true
}

impl BandDef {
    /// `[low, high)` band.
    pub fn half_open(label: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            label: label.into(),
            key: None,
            low,
            high,
            low_inclusive: true,
        }
    }

    /// `(low, high)` band.
    pub fn open(label: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            low_inclusive: false,
            ..Self::half_open(label, low, high)
        }
    }

    /// Sets the report key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The report key, or the label if none is set.
    pub fn report_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.label)
    }

    /// `true` if `frequency` falls in the band.
    pub fn contains(&self, frequency: f64) -> bool {
        let above_low = if self.low_inclusive {
            frequency >= self.low
        } else {
            frequency > self.low
        };
        above_low && frequency < self.high
    }
}

/// The three standard bands: `(0,100)`, `[100,150)`, `[150,300)`.
pub fn default_bands() -> Vec<BandDef> {
    vec![
        BandDef::open("1-100Hz", 0.0, 100.0).with_key("DNS_1_100"),
        BandDef::half_open("100-150Hz", 100.0, 150.0).with_key("DNS_100_150"),
        BandDef::half_open("150-300Hz", 150.0, 300.0).with_key("DNS_150_300"),
    ]
}

/// Checks a band list for use by [`aggregate_bands`].
///
/// Rejects an empty list, non-finite or inverted bounds, negative lower bounds,
/// a band that would include DC (`low == 0` inclusive), and repeated labels or
/// report keys.
pub fn validate_bands(bands: &[BandDef]) -> AppResult<()> {
    if bands.is_empty() {
        return Err(AnalysisError::Configuration(
            "at least one frequency band is required".into(),
        ));
    }
    let mut labels = HashSet::new();
    let mut keys = HashSet::new();
    for band in bands {
        is_ordered_range(band.low, band.high).map_err(|e| {
            AnalysisError::Configuration(format!("band '{}': {e}", band.label))
        })?;
        if band.low < 0.0 {
            return Err(AnalysisError::Configuration(format!(
                "band '{}': lower bound must not be negative",
                band.label
            )));
        }
        if band.low == 0.0 && band.low_inclusive {
            return Err(AnalysisError::Configuration(format!(
                "band '{}': DC (0 Hz) must be excluded, set low_inclusive = false",
                band.label
            )));
        }
        if !labels.insert(band.label.as_str()) {
            return Err(AnalysisError::Configuration(format!(
                "duplicate band label '{}'",
                band.label
            )));
        }
        if !keys.insert(band.report_key()) {
            return Err(AnalysisError::Configuration(format!(
                "duplicate band key '{}'",
                band.report_key()
            )));
        }
    }
    Ok(())
}

/// RMS of one channel in one band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandRms {
    /// Band label.
    pub label: String,
    /// Band report key.
    pub key: String,
    /// Root mean square, `0` for an empty band.
    pub rms: f64,
    /// Number of records that fell in the band.
    pub count: usize,
}

/// Per-band RMS values of one channel, in band order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRms {
    /// Channel name.
    pub channel: String,
    /// One entry per band.
    pub bands: Vec<BandRms>,
}

/// Channel → band → RMS, in channel order then band order.
///
/// Serializes as `{channel: {band label: rms}}`; see [`RmsResult::keyed`] for
/// the report-key form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RmsResult {
    channels: Vec<ChannelRms>,
}

impl RmsResult {
    /// Channels in order.
    pub fn channels(&self) -> &[ChannelRms] {
        &self.channels
    }

    /// Bands of one channel.
    pub fn channel(&self, channel: &str) -> Option<&ChannelRms> {
        self.channels.iter().find(|c| c.channel == channel)
    }

    /// RMS of `channel` in the band whose label or report key is `band`.
    pub fn get(&self, channel: &str, band: &str) -> Option<f64> {
        self.channel(channel)?
            .bands
            .iter()
            .find(|b| b.label == band || b.key == band)
            .map(|b| b.rms)
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// `true` when no channel was aggregated.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Serializable view keyed by band report keys instead of labels.
    pub fn keyed(&self) -> KeyedRms<'_> {
        KeyedRms(self)
    }

    fn serialize_with<S: Serializer>(&self, serializer: S, by_key: bool) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.channels.len()))?;
        for channel in &self.channels {
            map.serialize_entry(
                &channel.channel,
                &BandValues {
                    bands: &channel.bands,
                    by_key,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for RmsResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.serialize_with(serializer, false)
    }
}

/// [`RmsResult`] serialized with band report keys.
#[derive(Debug, Clone, Copy)]
pub struct KeyedRms<'a>(&'a RmsResult);

impl Serialize for KeyedRms<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize_with(serializer, true)
    }
}

struct BandValues<'a> {
    bands: &'a [BandRms],
    by_key: bool,
}

impl Serialize for BandValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.bands.len()))?;
        for band in self.bands {
            let name = if self.by_key { &band.key } else { &band.label };
            map.serialize_entry(name, &band.rms)?;
        }
        map.end()
    }
}

/// Root-mean-square of a set of values; `0` for an empty set.
pub fn rms(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum_sq, count) = values
        .into_iter()
        .fold((0.0_f64, 0usize), |(s, n), v| (s + v * v, n + 1));
    if count == 0 {
        0.0
    } else {
        (sum_sq / count as f64).sqrt()
    }
}

/// Computes the RMS of every channel in every band.
///
/// Channels are reported in the order given (a repeated name is reported
/// once). A channel absent from the table yields `0` in every band.
pub fn aggregate_bands<S: AsRef<str>>(table: &Table, channels: &[S], bands: &[BandDef]) -> RmsResult {
    let selections: Vec<Vec<usize>> = bands
        .iter()
        .map(|band| {
            table
                .iter()
                .enumerate()
                .filter(|(_, r)| band.contains(r.frequency))
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    let records = table.records();
    let mut seen: HashSet<&str> = HashSet::new();
    let channels = channels
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| seen.insert(*c))
        .map(|channel| ChannelRms {
            channel: channel.to_string(),
            bands: bands
                .iter()
                .zip(&selections)
                .map(|(band, rows)| BandRms {
                    label: band.label.clone(),
                    key: band.report_key().to_string(),
                    rms: rms(rows.iter().map(|&i| records[i].value_or_zero(channel))),
                    count: rows.len(),
                })
                .collect(),
        })
        .collect();

    RmsResult { channels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement_types::Record;

    fn constant_table(freqs: &[f64], value: f64) -> Table {
        freqs
            .iter()
            .map(|&f| Record::new(f).with_channel("c", value))
            .collect()
    }

    #[test]
    fn default_band_boundaries() {
        let table = constant_table(&[0.0, 50.0, 100.0, 150.0, 200.0, 300.0], 2.0);
        let result = aggregate_bands(&table, &["c"], &default_bands());
        let c = result.channel("c").unwrap();
        let counts: Vec<usize> = c.bands.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 2]);
        for band in &c.bands {
            assert_eq!(band.rms, 2.0);
        }
    }

    #[test]
    fn dc_and_upper_edge_are_in_no_band() {
        let bands = default_bands();
        for f in [0.0, 300.0, 450.0, -1.0] {
            assert!(bands.iter().all(|b| !b.contains(f)), "{f} should be excluded");
        }
        assert!(bands[0].contains(0.5));
        assert!(bands[1].contains(100.0));
        assert!(!bands[0].contains(100.0));
    }

    #[test]
    fn empty_band_is_zero_not_nan() {
        let table = constant_table(&[10.0, 20.0], 3.0);
        let result = aggregate_bands(&table, &["c"], &default_bands());
        assert_eq!(result.get("c", "1-100Hz"), Some(3.0));
        assert_eq!(result.get("c", "100-150Hz"), Some(0.0));
        assert_eq!(result.get("c", "DNS_150_300"), Some(0.0));
    }

    #[test]
    fn missing_values_count_as_zero() {
        let table = Table::new(vec![
            Record::new(10.0).with_channel("c", 4.0),
            Record::new(20.0),
        ]);
        let result = aggregate_bands(&table, &["c", "absent"], &default_bands());
        // sqrt((16 + 0) / 2)
        assert_eq!(result.get("c", "1-100Hz"), Some(8.0_f64.sqrt()));
        assert_eq!(result.get("absent", "1-100Hz"), Some(0.0));
    }

    #[test]
    fn rms_of_mixed_values() {
        assert_eq!(rms([3.0, 4.0, 0.0, 0.0]), 2.5);
        assert_eq!(rms(Vec::new()), 0.0);
    }

    #[test]
    fn serializes_in_channel_then_band_order() {
        let table = constant_table(&[50.0], 1.0);
        let result = aggregate_bands(&table, &["c"], &default_bands());
        let by_label = serde_json::to_string(&result).unwrap();
        assert_eq!(
            by_label,
            r#"{"c":{"1-100Hz":1.0,"100-150Hz":0.0,"150-300Hz":0.0}}"#
        );
        let by_key = serde_json::to_string(&result.keyed()).unwrap();
        assert_eq!(
            by_key,
            r#"{"c":{"DNS_1_100":1.0,"DNS_100_150":0.0,"DNS_150_300":0.0}}"#
        );
    }

    #[test]
    fn default_bands_validate() {
        assert!(validate_bands(&default_bands()).is_ok());
    }

    #[test]
    fn invalid_band_lists_are_rejected() {
        assert!(validate_bands(&[]).is_err());
        assert!(validate_bands(&[BandDef::half_open("dc", 0.0, 10.0)]).is_err());
        assert!(validate_bands(&[BandDef::half_open("inv", 50.0, 10.0)]).is_err());
        assert!(validate_bands(&[BandDef::half_open("neg", -5.0, 10.0)]).is_err());
        assert!(validate_bands(&[
            BandDef::half_open("a", 1.0, 10.0),
            BandDef::half_open("a", 10.0, 20.0),
        ])
        .is_err());
    }

    #[test]
    fn repeated_channels_reported_once() {
        let table = constant_table(&[50.0], 1.0);
        let result = aggregate_bands(&table, &["c", "c"], &default_bands());
        assert_eq!(result.len(), 1);
    }
}
