use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Album name used when a record carries no album.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One stretch of a track being streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayEvent {
    pub timestamp: DateTime<Utc>,
    pub artist: String,
    pub track: String,
    pub album: String,
    pub ms_played: u64,
}

/// Running total for one artist, track or album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTotal {
    pub name: String,
    /// Set for tracks, which are identified by (name, artist).
    pub artist: Option<String>,
    pub total_ms: u64,
    pub plays: u64,
    /// Position of the first contributing event in the loaded sequence.
    pub first_seen: usize,
}

/// An entity as it appears in a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub rank: usize,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub total_ms: u64,
    pub plays: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourBucket {
    pub hour: u8,
    pub total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayBucket {
    /// Monday = 0 .. Sunday = 6
    pub index: u8,
    pub name: String,
    pub total_ms: u64,
}

impl WeekdayBucket {
    pub fn new(index: u8, total_ms: u64) -> Self {
        Self {
            index,
            name: WEEKDAY_NAMES[index as usize % 7].to_string(),
            total_ms,
        }
    }
}

/// A run of consecutive calendar days with listening activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub days: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    Morning,
    Afternoon,
    Evening,
}

impl TimePeriod {
    pub fn from_hour(hour: u8) -> Self {
        match hour {
            6..=11 => TimePeriod::Morning,
            12..=17 => TimePeriod::Afternoon,
            _ => TimePeriod::Evening,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimePeriod::Morning => "morning",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Everything one analysis run produces. Field names are the keys of the
/// exported JSON document and must stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub source: String,
    pub timezone: String,

    pub files_loaded: usize,
    pub skipped_files: Vec<SkippedFile>,
    pub total_records: usize,
    pub rejected_records: usize,
    pub total_plays: u64,

    pub total_ms: u64,
    pub total_minutes: f64,
    pub active_days: usize,
    pub average_daily_minutes: f64,
    pub unique_tracks: usize,

    pub top_artists: Vec<RankedEntity>,
    pub top_tracks: Vec<RankedEntity>,
    pub top_albums: Vec<RankedEntity>,

    pub hourly_ms: [u64; 24],
    pub weekday_ms: [u64; 7],
    pub daily: Vec<DayBucket>,

    pub most_active_hour: Option<HourBucket>,
    pub time_period: Option<TimePeriod>,
    pub most_active_weekdays: Vec<WeekdayBucket>,
    pub longest_streak: Option<Streak>,
    pub most_played_day: Option<DayBucket>,
}

impl AnalysisResult {
    pub fn total_hours(&self) -> f64 {
        self.total_ms as f64 / MS_PER_HOUR
    }
}

pub const MS_PER_MINUTE: f64 = 60_000.0;
pub const MS_PER_HOUR: f64 = 3_600_000.0;
pub const MS_PER_DAY: f64 = 86_400_000.0;
