use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Robot telemetry record as stored in the `logs` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    pub robot: String,
    #[sqlx(rename = "deviceGeneration")]
    pub device_generation: String,
    #[sqlx(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[sqlx(rename = "endTime")]
    pub end_time: DateTime<Utc>,
    /// Milliseconds between start and end, negative when the robot clock skewed
    pub duration: i64,
    pub lat: f64,
    pub lng: f64,
}

/// Validated entry from an ingestion batch, ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub robot: String,
    pub device_generation: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64,
    pub lat: f64,
    pub lng: f64,
}

impl NewLogEntry {
    pub fn new(
        robot: String,
        device_generation: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        lat: f64,
        lng: f64,
    ) -> Self {
        let duration = (end_time - start_time).num_milliseconds();
        Self {
            robot,
            device_generation,
            start_time,
            end_time,
            duration,
            lat,
            lng,
        }
    }
}

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 500;

/// Filters and pagination window for `GET /logs`
#[derive(Debug, Clone, PartialEq)]
pub struct LogFilter {
    pub min_duration: Option<f64>,
    pub device_generation: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            min_duration: None,
            device_generation: None,
            from: None,
            to: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl LogFilter {
    /// Whether a stored row satisfies every filter that is set
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.min_duration
            .map_or(true, |min| entry.duration as f64 >= min)
            && self
                .device_generation
                .as_ref()
                .map_or(true, |g| &entry.device_generation == g)
            && self.from.map_or(true, |from| entry.start_time >= from)
            && self.to.map_or(true, |to| entry.end_time <= to)
    }
}
