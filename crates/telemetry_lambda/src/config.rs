use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use telemetry_core::contract::{DEFAULT_DEVICE_ID, DEFAULT_WINDOW_HOURS};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HandlerConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// DynamoDB table holding readings keyed by (deviceId, timestamp)
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// API Gateway stage name stripped from incoming paths
    #[serde(default = "default_stage_prefix")]
    pub stage_prefix: String,

    /// Device queried when the request omits `deviceId`
    #[serde(default = "default_device_id")]
    pub default_device_id: String,

    /// Window length used when the request omits `hours`
    #[serde(default = "default_window_hours")]
    pub default_window_hours: i64,

    /// IoT data-plane endpoint override, e.g. `https://xxxx-ats.iot.us-east-2.amazonaws.com`
    #[serde(default)]
    pub iot_endpoint: Option<String>,

    /// SNS topic receiving over-temperature alerts
    #[serde(default)]
    pub alert_topic_arn: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_table_name() -> String {
    "E_temp_esp32".to_string()
}

fn default_stage_prefix() -> String {
    "/E_stage_API".to_string()
}

fn default_device_id() -> String {
    DEFAULT_DEVICE_ID.to_string()
}

fn default_window_hours() -> i64 {
    DEFAULT_WINDOW_HOURS
}

impl HandlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("TELEMETRY"))
            .build()?
            .try_deserialize()
    }

    pub fn require_alert_topic_arn(&self) -> Result<&str, ConfigError> {
        match self.alert_topic_arn.as_deref() {
            Some(arn) if !arn.trim().is_empty() => Ok(arn),
            _ => Err(ConfigError::NotFound(
                "TELEMETRY_ALERT_TOPIC_ARN must be configured".to_string(),
            )),
        }
    }
}
