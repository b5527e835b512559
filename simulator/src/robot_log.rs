use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload shape accepted by `POST /logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotLog {
    pub robot: String,
    pub device_generation: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
}
