use crate::error::{Result, StatsError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One commit touching a tracked manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub timestamp: String,
    pub snapshot_id: String,
}

impl ChangeEvent {
    pub fn new(timestamp: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            snapshot_id: snapshot_id.into(),
        }
    }

    pub fn month(&self) -> Result<MonthKey> {
        MonthKey::from_timestamp(&self.timestamp)
    }
}

/// Calendar month in `YYYY-MM` form. Lexicographic order is chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthKey(String);

impl MonthKey {
    pub fn from_timestamp(timestamp: &str) -> Result<Self> {
        let prefix = timestamp.get(..7).ok_or_else(|| {
            StatsError::MalformedResponse(format!("timestamp too short: '{timestamp}'"))
        })?;
        Self::parse(prefix)
    }

    pub fn parse(month: &str) -> Result<Self> {
        NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
            .map_err(|_| StatsError::MalformedResponse(format!("invalid month: '{month}'")))?;
        if month.len() != 7 {
            return Err(StatsError::MalformedResponse(format!("invalid month: '{month}'")));
        }
        Ok(Self(month.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type MonthlySnapshotIndex = BTreeMap<MonthKey, String>;

pub type MonthlyMetricSeries = BTreeMap<MonthKey, u64>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyHistory {
    pub counts: MonthlyMetricSeries,
    pub metric: MonthlyMetricSeries,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityStat {
    pub name: String,
    pub value: u64,
}

/// Entities of one manifest revision, in the order the payload listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub entries: Vec<EntityStat>,
}

impl EntitySnapshot {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(name, value)| EntityStat { name: name.into(), value })
                .collect(),
        }
    }

    /// Accepts an object keyed by entity name or an array of entity objects.
    /// A missing or non-numeric metric counts as zero.
    pub fn from_json(value: &Value, metric_field: Option<&str>) -> Result<Self> {
        let metric_of = |entry: &Value| -> u64 {
            metric_field
                .and_then(|field| entry.get(field))
                .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
                .unwrap_or(0)
        };

        let entries = match value {
            Value::Object(map) => map
                .iter()
                .map(|(name, entry)| EntityStat {
                    name: name.clone(),
                    value: metric_of(entry),
                })
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    let name = entry
                        .get("id")
                        .or_else(|| entry.get("name"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| i.to_string());
                    EntityStat { name, value: metric_of(entry) }
                })
                .collect(),
            other => {
                return Err(StatsError::MalformedResponse(format!(
                    "expected an object or array of entities, got {}",
                    json_kind(other)
                )))
            }
        };

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.value).sum()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value as f64).collect()
    }

    /// Stable descending order: equal values keep their payload order.
    pub fn sorted_desc(&self) -> Vec<&EntityStat> {
        let mut sorted: Vec<&EntityStat> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.value.cmp(&a.value));
        sorted
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    Linux,
    Windows,
    MacOS,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Linux, Platform::Windows, Platform::MacOS];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
            Platform::MacOS => "MacOS",
        }
    }
}

pub type PlatformCounts = BTreeMap<Platform, u64>;

pub type PlatformShares = BTreeMap<Platform, f64>;

pub fn empty_platform_counts() -> PlatformCounts {
    Platform::ALL.iter().map(|&p| (p, 0)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub version: String,
    pub published_at: NaiveDate,
    pub downloads: PlatformCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Plugins,
    Themes,
    Releases,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Plugins => "plugins",
            EntityKind::Themes => "themes",
            EntityKind::Releases => "releases",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
