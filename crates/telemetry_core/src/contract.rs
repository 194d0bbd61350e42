use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_DEVICE_ID: &str = "1";
pub const DEFAULT_WINDOW_HOURS: i64 = 24;
pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const NO_DATA_MESSAGE: &str = "No data found";

/// A single telemetry sample as decoded from the reading store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub device_id: String,
    pub timestamp_ms: i64,
    pub temp: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatestReadingResponse {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryPoint {
    pub timestamp: i64,
    pub temperature: f64,
    pub humidity: f64,
}

impl From<&Reading> for HistoryPoint {
    fn from(reading: &Reading) -> Self {
        Self {
            timestamp: reading.timestamp_ms,
            temperature: reading.temp,
            humidity: reading.humidity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryResponse {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub count: usize,
    pub data: Vec<HistoryPoint>,
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldStatistics {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub current: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatisticsResponse {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub period_hours: i64,
    pub temperature: FieldStatistics,
    pub humidity: FieldStatistics,
    #[serde(rename = "dataPoints")]
    pub data_points: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LedState {
    On,
    Off,
}

impl LedState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

/// Payload published on `control_led/{deviceId}`. `deviceId` echoes the
/// event's value unchanged, so a numeric id stays a JSON number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedCommand {
    #[serde(rename = "deviceId")]
    pub device_id: Value,
    pub led: LedState,
    pub timestamp: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActuationSummary {
    pub status: String,
    pub led_state_sent: LedCommand,
    pub sns_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
