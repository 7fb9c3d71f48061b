//! Tabular measurement types shared by every pipeline stage.
//!
//! A frequency-response sweep is held as a [`Table`] of [`Record`]s. Each record
//! has a mandatory `frequency` plus an open set of named channel values, and the
//! ordered channel names of the source file are kept separately in a
//! [`ColumnSchema`].
//!
//! Stages never mutate a table they were given: they clone records into a new
//! table and return it.

use crate::error::{AnalysisError, AppResult};
use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Name of the independent-variable field in serialized records.
pub const FREQUENCY_FIELD: &str = "frequency";

/// One row of a sweep: the frequency plus the value of every channel at it.
///
/// Channel lookup is by name; insertion order is irrelevant. A `BTreeMap` keeps
/// iteration deterministic so that identical inputs serialize identically.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Frequency in Hz.
    pub frequency: f64,
    channels: BTreeMap<String, f64>,
}

impl Record {
    /// Creates a record with no channel values.
    pub fn new(frequency: f64) -> Self {
        Self {
            frequency,
            channels: BTreeMap::new(),
        }
    }

    /// Builder-style insertion, mostly for tests and generators.
    pub fn with_channel(mut self, name: impl Into<String>, value: f64) -> Self {
        self.channels.insert(name.into(), value);
        self
    }

    /// Sets a channel value, returning the previous value if one existed.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.channels.insert(name.into(), value)
    }

    /// Value of a channel, if present.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.channels.get(name).copied()
    }

    /// Value of a channel, treating an absent channel as `0`.
    ///
    /// This is the tolerant default used by RSS derivation, band aggregation
    /// and CSV export alike.
    pub fn value_or_zero(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    /// Returns `true` if the record holds a value for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Iterates over `(channel, value)` pairs in name order.
    pub fn channels(&self) -> impl Iterator<Item = (&str, f64)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of channel values held (excluding frequency).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Returns a copy with every channel value transformed by `f`.
    /// The frequency is left untouched.
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            frequency: self.frequency,
            channels: self
                .channels
                .iter()
                .map(|(k, v)| (k.clone(), f(*v)))
                .collect(),
        }
    }
}

impl Serialize for Record {
    /// Serializes as a flat object: `frequency` first, then every channel.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.channels.len() + 1))?;
        map.serialize_entry(FREQUENCY_FIELD, &self.frequency)?;
        for (name, value) in &self.channels {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut channels = BTreeMap::<String, f64>::deserialize(deserializer)?;
        let frequency = channels
            .remove(FREQUENCY_FIELD)
            .ok_or_else(|| D::Error::missing_field(FREQUENCY_FIELD))?;
        Ok(Self {
            frequency,
            channels,
        })
    }
}

/// Ordered sequence of records sharing one channel schema.
///
/// Records are *expected* in ascending frequency order, but nothing relies on
/// it: band selection filters by value rather than by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    /// Wraps records as given.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Records in order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Smallest and largest frequency present, or `None` for an empty table.
    pub fn frequency_range(&self) -> Option<(f64, f64)> {
        self.records.iter().map(|r| r.frequency).fold(None, |acc, f| {
            Some(match acc {
                None => (f, f),
                Some((lo, hi)) => (lo.min(f), hi.max(f)),
            })
        })
    }

    /// Values of one channel across every record, absent values read as `0`.
    pub fn column(&self, name: &str) -> Vec<f64> {
        self.records.iter().map(|r| r.value_or_zero(name)).collect()
    }

    /// Unwraps the records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl FromIterator<Record> for Table {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Ordered, unique, non-empty list of channel names (source column order,
/// frequency column excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnSchema {
    names: Vec<String>,
}

impl ColumnSchema {
    /// Validates and wraps a list of channel names.
    ///
    /// Fails with [`AnalysisError::Format`] if the list is empty, a name is
    /// blank or repeats, or a name is [`FREQUENCY_FIELD`], which serialized
    /// records reserve for the frequency.
    pub fn new(names: Vec<String>) -> AppResult<Self> {
        if names.is_empty() {
            return Err(AnalysisError::Format(
                "column schema must name at least one channel".into(),
            ));
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.is_empty() {
                return Err(AnalysisError::Format("channel name cannot be empty".into()));
            }
            if name == FREQUENCY_FIELD {
                return Err(AnalysisError::Format(format!(
                    "channel name '{FREQUENCY_FIELD}' is reserved for the frequency column"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(AnalysisError::Format(format!(
                    "duplicate channel name '{name}'"
                )));
            }
        }
        Ok(Self { names })
    }

    /// Channel names in source order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false` for a schema built by [`ColumnSchema::new`].
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `true` if `name` is a channel.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Iterates over channel names in order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.names.iter()
    }
}

impl<'de> Deserialize<'de> for ColumnSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        ColumnSchema::new(names).map_err(D::Error::custom)
    }
}

impl<'a> IntoIterator for &'a ColumnSchema {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_missing_channel_reads_as_zero() {
        let r = Record::new(10.0).with_channel("a", 2.5);
        assert_eq!(r.get("a"), Some(2.5));
        assert_eq!(r.get("b"), None);
        assert_eq!(r.value_or_zero("b"), 0.0);
    }

    #[test]
    fn map_values_leaves_frequency_alone() {
        let r = Record::new(50.0).with_channel("a", 10.0).with_channel("b", -4.0);
        let halved = r.map_values(|v| v / 2.0);
        assert_eq!(halved.frequency, 50.0);
        assert_eq!(halved.get("a"), Some(5.0));
        assert_eq!(halved.get("b"), Some(-2.0));
        // source untouched
        assert_eq!(r.get("a"), Some(10.0));
    }

    #[test]
    fn record_serializes_frequency_first() {
        let r = Record::new(1.0).with_channel("Node_1_X", 3.0);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"frequency":1.0,"Node_1_X":3.0}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn record_without_frequency_fails_to_deserialize() {
        let result: Result<Record, _> = serde_json::from_str(r#"{"a":1.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn frequency_range_ignores_order() {
        let table: Table = [30.0, 5.0, 120.0, 60.0]
            .into_iter()
            .map(Record::new)
            .collect();
        assert_eq!(table.frequency_range(), Some((5.0, 120.0)));
        assert_eq!(Table::default().frequency_range(), None);
    }

    #[test]
    fn schema_rejects_duplicates_and_blanks() {
        assert!(ColumnSchema::new(vec!["a".into(), "b".into()]).is_ok());
        assert!(matches!(
            ColumnSchema::new(vec!["a".into(), "a".into()]),
            Err(AnalysisError::Format(_))
        ));
        assert!(ColumnSchema::new(vec!["a".into(), String::new()]).is_err());
        assert!(ColumnSchema::new(vec![]).is_err());
    }

    #[test]
    fn schema_rejects_reserved_frequency_name() {
        let err = ColumnSchema::new(vec!["a".into(), FREQUENCY_FIELD.into()]).unwrap_err();
        assert!(matches!(err, AnalysisError::Format(ref m) if m.contains("reserved")));
        // only the exact key collides in serialized records
        assert!(ColumnSchema::new(vec!["Frequency".into(), "frequency_hz".into()]).is_ok());
    }
}
