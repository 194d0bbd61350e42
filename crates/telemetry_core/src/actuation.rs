use serde_json::Value;

use crate::contract::{LedCommand, LedState, ValidationError};

pub const TEMPERATURE_THRESHOLD_C: f64 = 30.0;
pub const ALERT_SUBJECT: &str = "Warning temperature";
pub const CONTROL_TOPIC_PREFIX: &str = "control_led";

/// Telemetry event forwarded by the device rule engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    /// Text form used in the topic and alert.
    pub device_id: String,
    /// `deviceId` exactly as received, echoed in the command payload.
    pub device_id_value: Value,
    pub temp: f64,
    pub timestamp: Value,
}

impl TelemetryEvent {
    pub fn from_value(event: &Value) -> Result<Self, ValidationError> {
        let Some(object) = event.as_object() else {
            return Err(ValidationError::new("telemetry event must be a JSON object"));
        };

        let device_id_value = object
            .get("deviceId")
            .cloned()
            .ok_or_else(|| ValidationError::new("deviceId is required"))?;
        let device_id = match &device_id_value {
            Value::String(text) if !text.trim().is_empty() => text.clone(),
            Value::Number(number) => number.to_string(),
            _ => {
                return Err(ValidationError::new(
                    "deviceId must be a non-empty string",
                ))
            }
        };

        let temp = match object.get("temp") {
            Some(Value::Number(number)) => number
                .as_f64()
                .ok_or_else(|| ValidationError::new(format!("temp {number} is not a float")))?,
            Some(Value::String(text)) => text.trim().parse::<f64>().map_err(|_| {
                ValidationError::new(format!("temp must be numeric, got '{text}'"))
            })?,
            Some(other) => {
                return Err(ValidationError::new(format!(
                    "temp must be numeric, got {other}"
                )))
            }
            None => return Err(ValidationError::new("temp is required")),
        };
        if !temp.is_finite() {
            return Err(ValidationError::new(format!("temp must be finite, got {temp}")));
        }

        Ok(Self {
            device_id,
            device_id_value,
            temp,
            timestamp: object.get("timestamp").cloned().unwrap_or(Value::Null),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    pub message: String,
}

/// Everything one event should emit, decided before any side effect runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuationPlan {
    pub topic: String,
    pub command: LedCommand,
    pub alert: Option<Alert>,
}

pub fn exceeds_threshold(temp: f64) -> bool {
    temp > TEMPERATURE_THRESHOLD_C
}

pub fn decide_led_state(temp: f64) -> LedState {
    if exceeds_threshold(temp) {
        LedState::On
    } else {
        LedState::Off
    }
}

pub fn control_topic(device_id: &str) -> String {
    format!("{CONTROL_TOPIC_PREFIX}/{device_id}")
}

pub fn alert_message(device_id: &str, temp: f64) -> String {
    format!(
        "Warning: The temperature from.{device_id}  too high: {}°C",
        format_celsius(temp)
    )
}

pub fn plan_actuation(event: &TelemetryEvent) -> ActuationPlan {
    let alert = exceeds_threshold(event.temp).then(|| Alert {
        subject: ALERT_SUBJECT.to_string(),
        message: alert_message(&event.device_id, event.temp),
    });

    ActuationPlan {
        topic: control_topic(&event.device_id),
        command: LedCommand {
            device_id: event.device_id_value.clone(),
            led: decide_led_state(event.temp),
            timestamp: event.timestamp.clone(),
        },
        alert,
    }
}

// Alert text renders floats the way the original alert emails did: whole
// degrees keep one decimal ("31.0"), and magnitudes outside [1e-4, 1e16)
// switch to a signed two-digit exponent ("1e+20", "1.5e-05").
fn format_celsius(temp: f64) -> String {
    let magnitude = temp.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let scientific = format!("{temp:e}");
        let (mantissa, exponent) = scientific
            .split_once('e')
            .unwrap_or((scientific.as_str(), "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        format!("{mantissa}e{sign}{digits:0>2}")
    } else if temp.fract() == 0.0 {
        format!("{temp:.1}")
    } else {
        temp.to_string()
    }
}
