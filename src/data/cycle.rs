use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// One tracked period. `end == None` means the period is still open.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CycleRecord {
    pub id: String,
    pub start: NaiveDate,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CycleRecord {
    pub fn new(id: &str, start: NaiveDate, end: Option<NaiveDate>, notes: Option<&str>) -> Self {
        CycleRecord {
            id: id.to_string(),
            start,
            end,
            notes: notes.map(str::to_string),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// A logged point-in-time event (shown as droplets on the calendar).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PointEvent {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub ts: DateTime<FixedOffset>,
    pub protected: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PointEvent {
    pub fn new(ts: DateTime<FixedOffset>, protected: bool, notes: Option<&str>) -> Self {
        PointEvent {
            ts,
            protected,
            notes: notes.map(str::to_string),
        }
    }
}

/// Accepts RFC 3339 timestamps, and naive `YYYY-MM-DDTHH:MM:SS[.f]` ones
/// which are read as local wall-clock time.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.fixed_offset())
}

/// Tunables for the cycle predictions, stored per tracker entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionParams {
    #[serde(default = "default_luteal_days")]
    pub luteal_days: i64,
    #[serde(default = "default_recent_weight")]
    pub recent_weight: f64,
    #[serde(default = "default_long_weight")]
    pub long_weight: f64,
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

fn default_luteal_days() -> i64 {
    14
}

fn default_recent_weight() -> f64 {
    0.7
}

fn default_long_weight() -> f64 {
    0.3
}

fn default_recent_window() -> usize {
    3
}

impl Default for PredictionParams {
    fn default() -> Self {
        PredictionParams {
            luteal_days: default_luteal_days(),
            recent_weight: default_recent_weight(),
            long_weight: default_long_weight(),
            recent_window: default_recent_window(),
        }
    }
}

/// What `list_cycles` returns: the records and events of one entry.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CycleListing {
    #[serde(default)]
    pub cycles: Vec<CycleRecord>,
    #[serde(default)]
    pub sex_events: Vec<PointEvent>,
    #[serde(default)]
    pub params: PredictionParams,
}
