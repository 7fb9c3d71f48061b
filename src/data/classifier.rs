//! Channel classifier: partitions channel names into per-node X/Y/Z axis groups.
//!
//! Classification runs in two phases:
//!
//! 1. **Index** every column against the axis tags `_X`, `_Y`, `_Z`
//!    ([`find_axis_tag`]). How case is treated is chosen by [`AxisTagMode`] and
//!    applies to all three axes at once.
//! 2. **Resolve** groups: every X-tagged column opens a group whose base name is
//!    the text before its tag. The first Y-tagged and first Z-tagged columns (in
//!    schema order) whose names *start with* that base name complete it.
//!
//! The prefix rule tolerates naming variants (`Node_1_tm_x_file_1` pairs with
//! `Node_1_tm_y_file_1`) but note that base `Node_1` also prefixes `Node_10_Y`.
//! Groups missing Y or Z are kept in the result, marked incomplete, and
//! produce no RSS channel.

use crate::measurement_types::ColumnSchema;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Prefix of every derived vector-magnitude channel.
pub const RSS_PREFIX: &str = "RSS_";

static STRICT_TAGS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    Axis::ALL.map(|axis| Regex::new(&format!("_{}", axis.letter())).expect("valid axis tag regex"))
});

static ANY_CASE_TAGS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    Axis::ALL
        .map(|axis| Regex::new(&format!("(?i)_{}", axis.letter())).expect("valid axis tag regex"))
});

static SOURCE_NODE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Node_(\d+)_").expect("valid node id regex"));

/// How axis tags are matched against channel names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisTagMode {
    /// Only the uppercase tags `_X`, `_Y`, `_Z` are recognised.
    StrictUpper,
    /// `_X`/`_x`, `_Y`/`_y`, `_Z`/`_z` are all recognised.
    #[default]
    AnyCase,
}

/// One of the three orthogonal measurement axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Tagged `_X`.
    X,
    /// Tagged `_Y`.
    Y,
    /// Tagged `_Z`.
    Z,
}

impl Axis {
    /// The axes in derivation order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Byte offset of the first occurrence of `axis`'s tag in `name`, if any.
///
/// This is the single matching rule used by the classifier. In
/// [`AxisTagMode::AnyCase`] the earliest tag of either case wins.
pub fn find_axis_tag(name: &str, axis: Axis, mode: AxisTagMode) -> Option<usize> {
    let tags = match mode {
        AxisTagMode::StrictUpper => &*STRICT_TAGS,
        AxisTagMode::AnyCase => &*ANY_CASE_TAGS,
    };
    tags[axis.index()].find(name).map(|m| m.start())
}

/// The X/Y/Z channels belonging to one physical node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisGroup {
    /// Channel-name text preceding the X tag.
    pub base_name: String,
    /// X channel name.
    pub x: String,
    /// Y channel name, if found.
    pub y: Option<String>,
    /// Z channel name, if found.
    pub z: Option<String>,
}

impl AxisGroup {
    /// A group produces an RSS channel only when all three axes are present.
    pub fn is_complete(&self) -> bool {
        self.y.is_some() && self.z.is_some()
    }

    /// The `(x, y, z)` channel names of a complete group.
    pub fn axes(&self) -> Option<(&str, &str, &str)> {
        match (&self.y, &self.z) {
            (Some(y), Some(z)) => Some((self.x.as_str(), y.as_str(), z.as_str())),
            _ => None,
        }
    }

    /// Name of the RSS channel this group derives, e.g. `RSS_1` for `Node_1`.
    pub fn rss_channel_name(&self) -> String {
        rss_channel_name(&self.base_name)
    }
}

/// Derives the RSS channel name for a base name.
///
/// The suffix is the node token of the base name: the last underscore-delimited
/// token that contains a digit, so that trailing qualifiers are dropped
/// (`Node_8000001_tm` gives `RSS_8000001`). Without such a token the last token
/// is used (`Sensor_A` gives `RSS_A`), and a base name without underscores is
/// used whole.
pub fn rss_channel_name(base_name: &str) -> String {
    let token = base_name
        .rsplit('_')
        .find(|t| t.chars().any(|c| c.is_ascii_digit()))
        .or_else(|| base_name.rsplit('_').next())
        .unwrap_or(base_name);
    format!("{RSS_PREFIX}{token}")
}

/// Axis groups in discovery order (the order of their X columns).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AxisGroups {
    groups: Vec<AxisGroup>,
}

impl AxisGroups {
    /// Wraps groups in discovery order.
    pub fn new(groups: Vec<AxisGroup>) -> Self {
        Self { groups }
    }

    /// All groups, complete or not.
    pub fn iter(&self) -> std::slice::Iter<'_, AxisGroup> {
        self.groups.iter()
    }

    /// Complete groups only, still in discovery order.
    pub fn complete(&self) -> impl Iterator<Item = &AxisGroup> {
        self.groups.iter().filter(|g| g.is_complete())
    }

    /// First group with the given base name.
    pub fn get(&self, base_name: &str) -> Option<&AxisGroup> {
        self.groups.iter().find(|g| g.base_name == base_name)
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// `true` when no X channel was found.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a> IntoIterator for &'a AxisGroups {
    type Item = &'a AxisGroup;
    type IntoIter = std::slice::Iter<'a, AxisGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Groups the columns of a schema into per-node axis groups.
pub fn classify(columns: &ColumnSchema, mode: AxisTagMode) -> AxisGroups {
    let tagged = |axis: Axis| -> Vec<&str> {
        columns
            .iter()
            .map(String::as_str)
            .filter(|name| find_axis_tag(name, axis, mode).is_some())
            .collect()
    };
    let y_cols = tagged(Axis::Y);
    let z_cols = tagged(Axis::Z);

    let mut groups = Vec::new();
    for name in columns.iter() {
        let Some(pos) = find_axis_tag(name, Axis::X, mode) else {
            continue;
        };
        let base_name = &name[..pos];
        let matching = |cols: &[&str]| {
            cols.iter()
                .find(|c| c.starts_with(base_name))
                .map(|c| c.to_string())
        };
        let group = AxisGroup {
            base_name: base_name.to_string(),
            x: name.clone(),
            y: matching(&y_cols),
            z: matching(&z_cols),
        };
        if !group.is_complete() {
            debug!(
                base = %group.base_name,
                has_y = group.y.is_some(),
                has_z = group.z.is_some(),
                "incomplete axis group, no RSS channel"
            );
        }
        groups.push(group);
    }

    debug!(
        ?mode,
        x = groups.len(),
        y = y_cols.len(),
        z = z_cols.len(),
        "detected direction columns"
    );
    AxisGroups::new(groups)
}

/// Node ids named by source channels of the form `Node_<digits>_...`,
/// sorted and de-duplicated.
pub fn source_node_ids(columns: &ColumnSchema) -> Vec<u64> {
    let mut ids: Vec<u64> = columns
        .iter()
        .filter_map(|name| SOURCE_NODE_ID.captures(name))
        .filter_map(|caps| caps[1].parse().ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
