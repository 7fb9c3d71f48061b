//! RSS deriver: vector magnitude channels from complete axis groups.
//!
//! For every complete [`AxisGroup`] and every record the deriver computes
//! `sqrt(x² + y² + z²)` and stores it under the group's RSS channel name in a
//! copy of the record. Source channels are kept unchanged. An axis value missing
//! from a record counts as `0`.
//!
//! Two groups can map to the same RSS name (`A_1` and `B_1` both give `RSS_1`).
//! [`CollisionPolicy`] makes the outcome explicit: by default the group
//! discovered last overwrites earlier ones, and a warning is logged.

use crate::data::classifier::{AxisGroups, RSS_PREFIX};
use crate::error::{AnalysisError, AppResult};
use crate::measurement_types::Table;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{info, warn};

static RSS_NODE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{RSS_PREFIX}(\d+)")).expect("valid RSS node regex")
});

/// What happens when two complete groups derive the same RSS channel name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The later group's values replace the earlier group's. The channel is
    /// listed once, at the position of its first appearance.
    #[default]
    LastWriteWins,
    /// Fail with [`AnalysisError::RssCollision`].
    Reject,
}

/// Result of RSS derivation.
#[derive(Debug, Clone)]
pub struct RssDerivation {
    /// Source records plus one channel per derived RSS name.
    pub table: Table,
    /// Derived channel names in group discovery order, without repeats.
    pub rss_columns: Vec<String>,
}

/// Root-sum-of-squares of three orthogonal components.
pub fn rss(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

/// Appends an RSS channel per complete axis group to a copy of `table`.
pub fn derive_rss(
    table: &Table,
    groups: &AxisGroups,
    policy: CollisionPolicy,
) -> AppResult<RssDerivation> {
    // (rss name, x, y, z) in discovery order; duplicates stay so the later
    // entry is written last.
    let mut plan: Vec<(String, &str, &str, &str)> = Vec::new();
    let mut rss_columns: Vec<String> = Vec::new();
    let mut owners: HashMap<String, &str> = HashMap::new();

    for group in groups.complete() {
        let Some((x, y, z)) = group.axes() else {
            continue;
        };
        let name = group.rss_channel_name();
        if let Some(first) = owners.get(name.as_str()) {
            match policy {
                CollisionPolicy::Reject => {
                    return Err(AnalysisError::RssCollision {
                        channel: name,
                        first: first.to_string(),
                        second: group.base_name.clone(),
                    });
                }
                CollisionPolicy::LastWriteWins => {
                    warn!(
                        channel = %name,
                        first = %first,
                        second = %group.base_name,
                        "RSS channel name collision, later group overwrites"
                    );
                }
            }
        } else {
            rss_columns.push(name.clone());
        }
        owners.insert(name.clone(), group.base_name.as_str());
        plan.push((name, x, y, z));
    }

    let derived: Table = table
        .iter()
        .map(|record| {
            let mut out = record.clone();
            for (name, x, y, z) in &plan {
                let value = rss(
                    record.value_or_zero(x),
                    record.value_or_zero(y),
                    record.value_or_zero(z),
                );
                out.insert(name.clone(), value);
            }
            out
        })
        .collect();

    info!(
        channels = rss_columns.len(),
        rows = derived.len(),
        "Generated RSS columns: {:?}",
        rss_columns
    );

    Ok(RssDerivation {
        table: derived,
        rss_columns,
    })
}

/// Numeric node ids of `RSS_<digits>` channels, sorted and de-duplicated.
/// Channels whose suffix does not start with a digit are ignored.
pub fn node_ids<S: AsRef<str>>(rss_columns: &[S]) -> Vec<u64> {
    let mut ids: Vec<u64> = rss_columns
        .iter()
        .filter_map(|c| RSS_NODE_ID.captures(c.as_ref()))
        .filter_map(|caps| caps[1].parse().ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
